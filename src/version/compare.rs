//! Dotted prefix comparison of version strings.

/// Returns true when `local` already satisfies `remote`.
///
/// A leading "v"/"V" is ignored on both sides and anything after the first
/// "-" in `local` is dropped (`1.2.3-1ubuntu1` reads as `1.2.3`). Components
/// are compared as plain strings, up to the length of the shorter list.
pub fn is_up_to_date(remote: &str, local: &str) -> bool {
    let remote = remote.trim_start_matches(['v', 'V']);
    let local = local.trim_start_matches(['v', 'V']);
    let local = local.split('-').next().unwrap_or(local);

    remote
        .split('.')
        .zip(local.split('.'))
        .all(|(r, l)| r == l)
}
