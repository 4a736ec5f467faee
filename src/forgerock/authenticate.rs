use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::borrow::Cow;

use super::ForgeRockError;

/// The high-level format exchanged with the authenticate endpoint.
///
/// AM authenticates in rounds. Each round, the server hands the client a list
/// of "callbacks" to fill in, and the client posts the whole object back.
///
/// For example, given an initial server response of:
/// ```json
/// {
///     "authId": "eyJ[..]",
///     "callbacks": [
///         {
///             "type": "NameCallback",
///             "output": [{ "name": "prompt", "value": "User Name:" }],
///             "input": [{ "name": "IDToken1", "value": "" }]
///         }
///     ]
/// }
/// ```
///
/// The client is expected to send back the *exact same* JSON object, but
/// with the first input's `value` set to whatever the user typed.
/// Once the server is satisfied, it answers with a `tokenId` instead.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AuthExchange {
    /// The SSO token, present once authentication has succeeded.
    #[serde(rename = "tokenId", skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(rename = "successUrl", skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    /// A JWT containing the state of this authentication tree.
    #[serde(rename = "authId", skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    /// HTTP-style status code, only sent alongside failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Callbacks the client must perform in order to be authenticated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<CallbackDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Anything else the server sent. We echo it back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What the client should do with a freshly received exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Failure,
    Continuation,
}

impl AuthExchange {
    /// Classifies this exchange.
    ///
    /// A token always wins. A 401 only counts as a failure when the server
    /// did not also hand us an `authId` to continue with.
    pub fn classify(&self) -> Classification {
        if self.token_id.as_deref().is_some_and(|token| !token.is_empty()) {
            return Classification::Success;
        }
        if self.auth_id.is_none() && self.code == Some(401) {
            return Classification::Failure;
        }
        Classification::Continuation
    }
}

/// The known callback types. Anything else is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Name,
    Password,
    TextInput,
    TextOutput,
    Confirmation,
    Choice,
    HiddenValue,
    Redirect,
    PollingWait,
    ReCaptcha,
    Unknown,
}

impl CallbackKind {
    pub fn from_type(callback_type: &str) -> Self {
        match callback_type {
            "NameCallback" => Self::Name,
            "PasswordCallback" => Self::Password,
            "TextInputCallback" => Self::TextInput,
            "TextOutputCallback" => Self::TextOutput,
            "ConfirmationCallback" => Self::Confirmation,
            "ChoiceCallback" => Self::Choice,
            "HiddenValueCallback" => Self::HiddenValue,
            "RedirectCallback" => Self::Redirect,
            "PollingWaitCallback" => Self::PollingWait,
            "ReCaptchaCallback" => Self::ReCaptcha,
            _ => Self::Unknown,
        }
    }

    /// Whether the user is expected to interact with this callback.
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            Self::Name
                | Self::Password
                | Self::TextInput
                | Self::Confirmation
                | Self::Choice
                | Self::Unknown
        )
    }

    /// Whether this callback already gives the page a way to move on,
    /// so no login button needs to be added.
    pub fn ends_page(self) -> bool {
        matches!(self, Self::Confirmation | Self::PollingWait | Self::Redirect)
    }
}

/// An individual callback the client is expected to perform and provide.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CallbackDescriptor {
    /// The `type` of callback this client must handle.
    ///
    /// This stays a string so that types we don't know about are sent
    /// back exactly as we received them.
    #[serde(rename = "type")]
    pub callback_type: String,
    /// Server-side provided information over this callback.
    #[serde(default)]
    pub output: Vec<ValuePair>,
    /// Information the client must provide when responding.
    #[serde(default)]
    pub input: Vec<ValuePair>,
    /// Hidden identifier that shows up with multiple callbacks.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

/// A simple key-value pair.
/// Observed values are strings, numbers, arrays of strings, and objects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValuePair {
    pub name: String,
    pub value: Value,
}

impl ValuePair {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl CallbackDescriptor {
    pub fn kind(&self) -> CallbackKind {
        CallbackKind::from_type(&self.callback_type)
    }

    /// Looks up a server-provided output by name.
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.output
            .iter()
            .find(|pair| pair.name == name)
            .map(|pair| &pair.value)
    }

    /// Like [`output`](Self::output), but the rendering of this callback
    /// cannot go on without it.
    pub fn required_output(
        &self,
        index: usize,
        name: &'static str,
    ) -> Result<&Value, ForgeRockError> {
        self.output(name)
            .ok_or_else(|| ForgeRockError::MissingOutput {
                callback_type: self.callback_type.clone(),
                index,
                name,
            })
    }

    /// The current value of the first input, as text.
    pub fn input_value(&self) -> Cow<'_, str> {
        match self.input.first() {
            Some(pair) => value_text(&pair.value),
            None => Cow::Borrowed(""),
        }
    }

    /// The `prompt` output with a single trailing colon removed.
    pub fn prompt(&self) -> Cow<'_, str> {
        match self.output("prompt").map(value_text) {
            Some(Cow::Borrowed(prompt)) => {
                Cow::Borrowed(prompt.strip_suffix(':').unwrap_or(prompt))
            }
            Some(Cow::Owned(mut prompt)) => {
                if prompt.ends_with(':') {
                    prompt.pop();
                }
                Cow::Owned(prompt)
            }
            None => Cow::Borrowed(""),
        }
    }

    /// The button we add to pages that would otherwise have no way to submit.
    ///
    /// The server never sees this one: it only exists in the render plan.
    pub fn login_button(index: usize) -> Self {
        Self {
            callback_type: "ConfirmationCallback".to_string(),
            output: vec![
                ValuePair::new("prompt", json!("")),
                ValuePair::new("messageType", json!(0)),
                ValuePair::new("options", json!(["Login"])),
                ValuePair::new("optionType", json!(-1)),
                ValuePair::new("defaultOption", json!(0)),
            ],
            input: vec![ValuePair::new(format!("IDToken{}", index + 1), json!(0))],
            id: None,
        }
    }
}

/// Renders a JSON value the way it would appear inside a form field.
/// Strings lose their quotes and `null` becomes empty.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}
