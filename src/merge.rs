//! Carrying user customizations across re-uploads.
//!
//! Whole-document uploads preserve the avatar block and the user title by
//! locating both as named slots in the old and new documents and splicing the
//! old content in. Structured uploads carry the stored `profile` object
//! forward instead. Neither path may ever fail an upload: a missing slot or
//! an unparsable old record reads as "nothing to preserve".
use std::ops::Range;

use serde_json::Value;

use crate::models::Profile;

const AVATAR_MARKER: &str = "<div class=\"avatar\"";
const END_DIV: &str = "</div>";

const TITLE_MARKER: &str = "<span id=\"user-title\"";
const END_SPAN: &str = "</span>";

/// Byte ranges of the sub-elements a re-upload must preserve.
struct ReportSlots {
    /// The whole avatar block, open tag through `</div>`.
    avatar: Option<Range<usize>>,
    /// Inner text of the user-title span. The open tag stays with the new
    /// document so freshly generated attributes survive.
    title_inner: Option<Range<usize>>,
}

impl ReportSlots {
    fn locate(html: &str) -> Self {
        Self {
            avatar: find_avatar(html),
            title_inner: find_title_inner(html),
        }
    }
}

fn find_avatar(html: &str) -> Option<Range<usize>> {
    let start = html.find(AVATAR_MARKER)?;
    let end = html[start..].find(END_DIV)? + start + END_DIV.len();

    Some(start..end)
}

fn find_title_inner(html: &str) -> Option<Range<usize>> {
    let span = html.find(TITLE_MARKER)?;
    let open_end = html[span..].find('>')? + span + 1;
    let close = html[open_end..].find(END_SPAN)? + open_end;

    Some(open_end..close)
}

/// Splices the old avatar block and old title text into a freshly uploaded
/// document. Best-effort: each slot is spliced only when it is present in
/// both documents, everything else comes from the new document.
pub fn merge_avatar_and_title(old_html: &str, new_html: &str) -> String {
    let old = ReportSlots::locate(old_html);
    let mut merged = new_html.to_string();

    if let Some(old_avatar) = old.avatar {
        if let Some(new_avatar) = find_avatar(&merged) {
            merged.replace_range(new_avatar, &old_html[old_avatar]);
        }
    }

    if let Some(old_title) = old.title_inner {
        if let Some(new_title) = find_title_inner(&merged) {
            merged.replace_range(new_title, &old_html[old_title]);
        }
    }

    merged
}

/// Extracts the profile from a previously stored record. Lenient: a record
/// that does not parse, or parses without a usable profile, reads as no
/// profile at all.
pub fn carry_profile(old_value: &str) -> Option<Profile> {
    let old: Value = serde_json::from_str(old_value).ok()?;
    let profile = old.get("profile")?;

    serde_json::from_value(profile.clone()).ok()
}
