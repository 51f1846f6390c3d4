/// Default base URL for completions requests.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

fn normalized_base(input: &str) -> &str {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };
    base.trim_end_matches('/')
}

/// Chat completions endpoint for a base URL.
pub fn chat_completions_url(base: &str) -> String {
    format!("{}/chat/completions", normalized_base(base))
}

/// Legacy completions endpoint for a base URL.
pub fn completions_url(base: &str) -> String {
    format!("{}/completions", normalized_base(base))
}

/// Model-listing endpoint for a base URL.
pub fn models_url(base: &str) -> String {
    format!("{}/models", normalized_base(base))
}

/// Successively shorter base-path prefixes for the capability probe.
///
/// Some APIs serve the models listing above a versioned sub-path, so a probe
/// against `https://host/v1/beta` may need to fall back to `https://host/v1`
/// and then `https://host`. The scheme-and-host prefix is never shortened.
pub fn probe_prefixes(base: &str) -> Vec<String> {
    let base = normalized_base(base);
    let path_start = match base.find("://") {
        Some(scheme_end) => match base[scheme_end + 3..].find('/') {
            Some(offset) => scheme_end + 3 + offset,
            None => return vec![base.to_string()],
        },
        None => return vec![base.to_string()],
    };

    let mut prefixes = vec![base.to_string()];
    let mut current = base;
    while let Some(cut) = current.rfind('/') {
        if cut <= path_start {
            prefixes.push(base[..path_start].to_string());
            break;
        }
        current = &current[..cut];
        prefixes.push(current.to_string());
    }
    prefixes.dedup();
    prefixes
}
