use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Issued links embed the id, so this length is frozen: changing it would
/// orphan every report stored under the old ids.
pub const ID_LEN: usize = 8;

/// Maps a student key and the server salt to a stable report id.
///
/// With both inputs present the id is a fixed prefix of
/// `sha256(salt ":" key)`, so a returning client re-uploads onto the same
/// record. Without either input the id is random and each upload lands on a
/// fresh record.
pub fn derive_report_id(student_key: Option<&str>, salt: Option<&str>) -> String {
    match (student_key, salt) {
        (Some(key), Some(salt)) if !key.is_empty() && !salt.is_empty() => {
            let mut hasher = Sha256::new();
            hasher.update(salt.as_bytes());
            hasher.update(b":");
            hasher.update(key.as_bytes());

            let mut id = hex::encode(hasher.finalize());
            id.truncate(ID_LEN);
            id
        }
        _ => {
            let mut id = Uuid::new_v4().simple().to_string();
            id.truncate(ID_LEN);
            id
        }
    }
}
