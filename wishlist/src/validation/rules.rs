use super::ValidationIssue;

pub(super) const TITLE_MAX: usize = 200;
pub(super) const PRICE_MAX: usize = 50;
pub(super) const DESCRIPTION_MAX: usize = 5000;
pub(super) const IMAGE_MAX: usize = 2048;
pub(super) const CATEGORY_MAX_LEN: usize = 40;
pub(super) const CATEGORY_MAX_COUNT: usize = 10;
pub(super) const WEIGHT_LIMIT: i64 = 1_000_000;
pub(super) const BATCH_MAX: usize = 100;
pub(super) const VISITOR_ID_MAX: usize = 128;

/// Collects issues while the fields of one request are checked
#[derive(Debug, Default)]
pub(super) struct Issues(Vec<ValidationIssue>);

impl Issues {
    pub(super) fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(ValidationIssue::new(field, message));
    }

    pub(super) fn text(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            self.push(field, "Required");
        } else if len > max {
            self.push(field, format!("Must be at most {max} characters"));
        }
    }

    pub(super) fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            self.text(field, value, 0, max);
        }
    }

    pub(super) fn image(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value else {
            return;
        };
        self.text(field, value, 0, IMAGE_MAX);
        if !value.is_empty() && !is_image_reference(value) {
            self.push(field, "Must be a path starting with '/' or an http(s) URL");
        }
    }

    pub(super) fn categories(&mut self, field: &str, values: &[String]) {
        if values.len() > CATEGORY_MAX_COUNT {
            self.push(field, format!("At most {CATEGORY_MAX_COUNT} categories"));
        }
        for value in values {
            if !is_category(value) {
                self.push(
                    field,
                    format!("Invalid category '{value}': use 1-{CATEGORY_MAX_LEN} of [a-z0-9-]"),
                );
            }
        }
    }

    pub(super) fn weight(&mut self, field: &str, value: i64) {
        if !(-WEIGHT_LIMIT..=WEIGHT_LIMIT).contains(&value) {
            self.push(
                field,
                format!("Must be between -{WEIGHT_LIMIT} and {WEIGHT_LIMIT}"),
            );
        }
    }

    pub(super) fn finish<T>(self, output: T) -> Result<T, Vec<ValidationIssue>> {
        if self.0.is_empty() {
            Ok(output)
        } else {
            Err(self.0)
        }
    }
}

fn is_image_reference(value: &str) -> bool {
    if value.starts_with('/') && !value.starts_with("//") {
        return true;
    }
    match url::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

fn is_category(value: &str) -> bool {
    (1..=CATEGORY_MAX_LEN).contains(&value.len())
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Trims and drops empty optional strings
pub(super) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
