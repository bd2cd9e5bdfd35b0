use scraper::{Html, Selector};

/// `id` of the script element holding the page's hydration data
pub const HYDRATION_SCRIPT_ID: &str = "__NEXT_DATA__";

/// Pulls the embedded hydration JSON out of a results page
#[derive(Debug, Clone)]
pub struct PayloadExtractor {
    script_id: String,
}

impl PayloadExtractor {
    pub fn new() -> Self {
        Self::for_script_id(HYDRATION_SCRIPT_ID)
    }

    pub fn for_script_id(id: &str) -> Self {
        Self {
            script_id: id.to_string(),
        }
    }

    /// Text of the hydration script, or `None` if the page has none
    pub fn extract(&self, body: &str) -> Option<String> {
        let selector = Selector::parse(&format!(r#"script[id="{}"]"#, self.script_id)).ok()?;
        let document = Html::parse_document(body);
        let element = document.select(&selector).next()?;

        let text: String = element.text().collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl Default for PayloadExtractor {
    fn default() -> Self {
        Self::new()
    }
}
