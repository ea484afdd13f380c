/// Format an integer with `,` thousands separators, independent of locale.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Rejects empty keys and the placeholder values found in sample env files.
pub fn is_valid_api_key(api_key: &str) -> bool {
    let trimmed = api_key.trim();
    !trimmed.is_empty() && trimmed != "your_api_key_here" && trimmed != "test-key"
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// True when the text contains a bracketed placeholder such as `[Insert link]`.
pub fn has_placeholder_content(content: &str) -> bool {
    let Some(last_close) = content.rfind(']') else {
        return false;
    };

    content.as_bytes()[..last_close]
        .windows(2)
        .any(|pair| pair[0] == b'[' && pair[1].is_ascii_uppercase())
}

/// Sanity checks for generated newsletter text: the `# <title>` heading, at
/// least one `## ` section, and no leftover placeholders.
pub fn validate_newsletter_content(content: &str, title: &str) -> ContentValidation {
    let mut errors = Vec::new();

    if !content.contains(&format!("# {}", title)) {
        errors.push("Missing newsletter title".to_string());
    }

    if !content.lines().any(|line| line.starts_with("## ")) {
        errors.push("Newsletter must have at least one section (## heading)".to_string());
    }

    if has_placeholder_content(content) {
        errors.push("Newsletter contains placeholder content in brackets".to_string());
    }

    ContentValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
