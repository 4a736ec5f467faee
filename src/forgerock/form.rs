use serde_json::{json, Value};
use tracing::{debug, warn};

use super::render::{RedirectForm, RenderedForm};
use super::AuthExchange;

/// Wherever the login form ends up being shown.
///
/// In a browser this would be a DOM node; on a server it may be the body of
/// the next response. Either way the core never touches it directly.
pub trait RenderTarget: Send {
    /// Shows this form, replacing whatever was there before.
    fn mount(&mut self, form: &RenderedForm);

    /// Leaves the page. Nothing is mounted after this.
    fn navigate(&mut self, redirect: &RedirectForm);
}

/// Keeps hold of whatever was last rendered.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    pub form: Option<RenderedForm>,
    pub redirect: Option<RedirectForm>,
    pub mounts: usize,
}

impl MemoryTarget {
    /// The markup currently on "the page".
    pub fn html(&self) -> Option<String> {
        match (&self.redirect, &self.form) {
            (Some(redirect), _) => Some(redirect.to_html()),
            (None, Some(form)) => Some(form.html.clone()),
            (None, None) => None,
        }
    }
}

impl RenderTarget for MemoryTarget {
    fn mount(&mut self, form: &RenderedForm) {
        self.form = Some(form.clone());
        self.redirect = None;
        self.mounts += 1;
    }

    fn navigate(&mut self, redirect: &RedirectForm) {
        self.redirect = Some(redirect.clone());
    }
}

/// The fields of a submitted login form, in the order they were sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Reads an `application/x-www-form-urlencoded` body, as a browser posts it.
    pub fn from_urlencoded(body: &str) -> Self {
        url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect()
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl FromIterator<(String, String)> for FormSubmission {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Connects rendered forms to their target, and submissions back to callbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBinder;

impl FormBinder {
    /// Puts the form on the target, replacing anything already there.
    pub fn bind(target: &mut dyn RenderTarget, form: &RenderedForm) {
        target.mount(form);
    }

    /// Copies every `callback_<N>` field into the first input of callback `N`.
    ///
    /// Anything else is ignored, as is any index past the end of the
    /// exchange (which is where our own login button lives).
    /// Returns how many fields were applied.
    pub fn apply(exchange: &mut AuthExchange, submission: &FormSubmission) -> usize {
        let mut applied = 0;
        for (name, value) in &submission.fields {
            let Some(index) = callback_index(name) else {
                debug!(field = %name, "ignoring non-callback field");
                continue;
            };
            let Some(callback) = exchange.callbacks.get_mut(index) else {
                debug!(index, "ignoring field past the last callback");
                continue;
            };
            let Some(input) = callback.input.first_mut() else {
                warn!(index, callback_type = %callback.callback_type, "callback has no input to fill");
                continue;
            };

            input.value = typed_like(&input.value, value);
            applied += 1;
        }
        applied
    }
}

/// Parses `callback_<N>`, digits only.
pub fn callback_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix("callback_")?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Form fields are always text, but AM wants numbers back where it sent
/// numbers (choice and confirmation indexes, for example).
fn typed_like(current: &Value, submitted: &str) -> Value {
    if current.is_number() {
        if let Ok(number) = submitted.parse::<i64>() {
            return json!(number);
        }
    }
    json!(submitted)
}
