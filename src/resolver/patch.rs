//! Request patching.
//!
//! A patch list is a set of package requests laid over an existing request
//! list. Requests are matched by package family (the name without any
//! version or operator) and kind, so `maya-2025` replaces `maya==2024.1`
//! but `!maya-2023` is added next to it.

use crate::error::{LaunchError, Result};

/// Package family of a request string.
///
/// Leading `~` (weak), `!` (conflict) and `^` (removal) markers are skipped.
///
/// # Examples
///
/// - `maya-2024` → `maya`
/// - `python==3.9.1` → `python`
/// - `~nuke>13` → `nuke`
pub fn request_family(request: &str) -> &str {
    let name = request.trim_start_matches(['~', '!', '^']);
    let end = name
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(name.len());
    &name[..end]
}

/// Marker distinguishing weak (`~`) and conflict (`!`) requests from normal ones.
fn request_kind(request: &str) -> Option<char> {
    request.chars().next().filter(|c| matches!(c, '~' | '!'))
}

/// Turn qualified `name-version` strings into exact `name==version` requests.
pub fn pin_resolved(resolved: &[String]) -> Vec<String> {
    resolved
        .iter()
        .map(|qualified| match qualified.split_once('-') {
            Some((name, version)) if !version.is_empty() => format!("{}=={}", name, version),
            _ => qualified.trim_end_matches('-').to_string(),
        })
        .collect()
}

/// Lay `patches` over `base`.
///
/// - A patch replaces the base entry of the same family and kind (normal,
///   weak `~` or conflict `!`), in place. Each base entry is replaced at most once.
/// - Any other patch is appended.
/// - `^name` removes the family; under `strict` removing an absent family is an error.
pub fn patch_requests(base: &[String], patches: &[String], strict: bool) -> Result<Vec<String>> {
    let mut patched = base.to_vec();
    let mut replaced = vec![false; patched.len()];

    for patch in patches {
        let patch = patch.trim();
        let family = request_family(patch);
        if family.is_empty() {
            return Err(LaunchError::Resolver(format!(
                "invalid patch request '{}'",
                patch
            )));
        }

        if patch.starts_with('^') {
            let before = patched.len();
            (patched, replaced) = std::mem::take(&mut patched)
                .into_iter()
                .zip(std::mem::take(&mut replaced))
                .filter(|(request, _)| request_family(request) != family)
                .unzip();
            if strict && patched.len() == before {
                return Err(LaunchError::Resolver(format!(
                    "cannot remove '{}': package is not part of the context",
                    family
                )));
            }
            continue;
        }

        let kind = request_kind(patch);
        let target = patched.iter().rposition(|request| request_family(request) == family);
        match target {
            Some(index) if !replaced[index] && request_kind(&patched[index]) == kind => {
                patched[index] = patch.to_string();
                replaced[index] = true;
            }
            _ => {
                patched.push(patch.to_string());
                replaced.push(true);
            }
        }
    }

    Ok(patched)
}
