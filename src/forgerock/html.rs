//! The default markup for every callback type.
//!
//! These are public so a custom [`Renderer`](super::Renderer) can wrap or
//! reuse them instead of starting from scratch.
//!
//! Server-provided strings (prompts, messages, options) are inserted as-is,
//! without escaping, and a `TextOutputCallback` of message type `4` is
//! emitted as an executable script. The AM server is trusted to send markup
//! it wants shown.

use serde_json::Value;

use super::authenticate::value_text;
use super::render::{RedirectForm, RenderedUnit};
use super::{CallbackDescriptor, ForgeRockError};

/// The `id` of the form we render callbacks into.
pub const FORM_ID: &str = "fr-login-form";

/// The `id` of the auto-submitting form built for redirects.
pub const REDIRECT_FORM_ID: &str = "fr-redirect-form";

/// The message type AM uses for "run this as a script".
pub const SCRIPT_MESSAGE_TYPE: &str = "4";

/// Every field we render is named after its callback's position,
/// which is how the form binder finds its way back.
pub fn field_name(index: usize) -> String {
    format!("callback_{index}")
}

fn text_field(index: usize, callback: &CallbackDescriptor, input_type: &str) -> String {
    let name = field_name(index);
    let prompt = callback.prompt();
    let value = callback.input_value();
    format!(
        r#"<div class="form-group"><label for="{name}">{prompt}</label><input type="{input_type}" id="{name}" name="{name}" value="{value}" placeholder="{prompt}" class="form-control"></div>"#
    )
}

pub fn name_callback(index: usize, callback: &CallbackDescriptor) -> String {
    text_field(index, callback, "text")
}

pub fn password_callback(index: usize, callback: &CallbackDescriptor) -> String {
    text_field(index, callback, "password")
}

pub fn text_input_callback(index: usize, callback: &CallbackDescriptor) -> String {
    let name = field_name(index);
    let prompt = callback.prompt();
    let value = callback.input_value();
    format!(
        r#"<div class="form-group"><label for="{name}">{prompt}</label><textarea id="{name}" name="{name}" placeholder="{prompt}" class="form-control">{value}</textarea></div>"#
    )
}

/// Maps AM's numeric message types onto something readable.
/// Anything we don't recognize is treated as informational.
pub fn message_severity(message_type: &str) -> &'static str {
    match message_type {
        "1" => "warning",
        "2" => "error",
        _ => "informational",
    }
}

pub fn text_output_callback(
    index: usize,
    callback: &CallbackDescriptor,
) -> Result<String, ForgeRockError> {
    let message = value_text(callback.required_output(index, "message")?);
    let message_type = callback
        .output("messageType")
        .map(value_text)
        .unwrap_or_default();

    if message_type == SCRIPT_MESSAGE_TYPE {
        return Ok(format!("<script>{message}</script>"));
    }

    let severity = message_severity(&message_type);
    Ok(format!(
        r#"<div class="fr-message fr-message-{severity}" data-severity="{severity}">{message}</div>"#
    ))
}

/// Pulls an array of strings out of an output, e.g. `options` or `choices`.
fn string_list(
    index: usize,
    callback: &CallbackDescriptor,
    name: &'static str,
) -> Result<Vec<String>, ForgeRockError> {
    let Value::Array(entries) = callback.required_output(index, name)? else {
        return Err(ForgeRockError::InvalidOutput {
            callback_type: callback.callback_type.clone(),
            index,
            name,
        });
    };
    Ok(entries
        .iter()
        .map(|entry| value_text(entry).into_owned())
        .collect())
}

/// One submit button per option. The button's value is the option's index,
/// which is what AM expects back.
pub fn confirmation_callback(
    index: usize,
    callback: &CallbackDescriptor,
) -> Result<Vec<String>, ForgeRockError> {
    let name = field_name(index);
    let options = string_list(index, callback, "options")?;

    // A lone option is always the default, whatever the server claims.
    let default_option = if options.len() == 1 {
        Some(0)
    } else {
        callback
            .output("defaultOption")
            .and_then(|value| value_text(value).parse::<usize>().ok())
    };

    Ok(options
        .iter()
        .enumerate()
        .map(|(position, option)| {
            if default_option == Some(position) {
                format!(
                    r#"<button type="submit" name="{name}" value="{position}" class="fr-submit btn btn-primary" data-default="true">{option}</button>"#
                )
            } else {
                format!(
                    r#"<button type="submit" name="{name}" value="{position}" class="fr-submit btn btn-secondary">{option}</button>"#
                )
            }
        })
        .collect())
}

pub fn choice_callback(
    index: usize,
    callback: &CallbackDescriptor,
) -> Result<String, ForgeRockError> {
    let name = field_name(index);
    let prompt = callback.prompt();
    let selected = callback.input_value();
    let choices = string_list(index, callback, "choices")?;

    let options: String = choices
        .iter()
        .enumerate()
        .map(|(position, choice)| {
            if selected == position.to_string() {
                format!(r#"<option value="{position}" selected>{choice}</option>"#)
            } else {
                format!(r#"<option value="{position}">{choice}</option>"#)
            }
        })
        .collect();

    Ok(format!(
        r#"<div class="form-group"><label for="{name}">{prompt}</label><select id="{name}" name="{name}" class="form-control">{options}</select></div>"#
    ))
}

pub fn hidden_value_callback(index: usize, callback: &CallbackDescriptor) -> String {
    let name = field_name(index);
    let id = callback
        .output("id")
        .map(|id| value_text(id).into_owned())
        .unwrap_or_else(|| name.clone());
    let value = callback.input_value();
    format!(r#"<input type="hidden" id="{id}" name="{name}" value="{value}">"#)
}

/// Collects where a `RedirectCallback` wants the browser to go.
pub fn redirect_callback(
    index: usize,
    callback: &CallbackDescriptor,
) -> Result<RedirectForm, ForgeRockError> {
    let url = value_text(callback.required_output(index, "redirectUrl")?).into_owned();
    let method = callback
        .output("redirectMethod")
        .map(|method| value_text(method).into_owned())
        .filter(|method| !method.is_empty())
        .unwrap_or_else(|| "GET".to_string());

    // `redirectData` is an object of form fields, or null when there are none.
    let fields = match callback.output("redirectData") {
        Some(Value::Object(data)) => data
            .iter()
            .map(|(key, value)| (key.clone(), value_text(value).into_owned()))
            .collect(),
        _ => Vec::new(),
    };

    Ok(RedirectForm {
        url,
        method,
        fields,
    })
}

/// A form that posts itself as soon as it is on the page.
pub fn redirect_document(redirect: &RedirectForm) -> String {
    let fields: String = redirect
        .fields
        .iter()
        .map(|(key, value)| format!(r#"<input type="hidden" name="{key}" value="{value}">"#))
        .collect();
    format!(
        r#"<form id="{REDIRECT_FORM_ID}" method="{method}" action="{url}">{fields}</form><script>document.getElementById("{REDIRECT_FORM_ID}").submit();</script>"#,
        method = redirect.method,
        url = redirect.url,
    )
}

pub fn polling_wait_callback(_index: usize, callback: &CallbackDescriptor) -> String {
    let message = callback
        .output("message")
        .map(value_text)
        .unwrap_or_default();
    format!(r#"<p class="fr-wait">{message}</p>"#)
}

/// Renders the reCAPTCHA widget alongside the hidden field it fills in.
///
/// When nothing else on the page needs the user, there's nothing to click
/// "Login" for: the buttons are hidden and solving the challenge submits.
pub fn recaptcha_callback(
    index: usize,
    callback: &CallbackDescriptor,
    sole_interactive: bool,
) -> Result<String, ForgeRockError> {
    let name = field_name(index);
    let site_key = value_text(callback.required_output(index, "siteKey")?);
    let function = format!("frRecaptchaCallback{index}");

    let (hide_buttons, submit) = if sole_interactive {
        (
            format!(
                r##"setTimeout(function () {{ document.querySelectorAll("#{FORM_ID} .fr-submit").forEach(function (button) {{ button.style.display = "none"; }}); }});"##
            ),
            "field.form.requestSubmit();",
        )
    } else {
        (String::new(), "")
    };

    Ok(format!(
        r#"<div class="form-group"><script src="https://www.google.com/recaptcha/api.js" async defer></script><div class="g-recaptcha" data-sitekey="{site_key}" data-callback="{function}"></div><input type="hidden" id="{name}" name="{name}" value=""><script>function {function}(token) {{ var field = document.getElementById("{name}"); field.value = token; {submit} }}{hide_buttons}</script></div>"#
    ))
}

/// Wraps every unit in our form, one line break between each.
pub fn form(header: Option<&str>, stage: Option<&str>, units: &[RenderedUnit]) -> String {
    let stage = stage
        .map(|stage| format!(r#" data-stage="{stage}""#))
        .unwrap_or_default();
    let header = header
        .map(|header| format!(r#"<h2 class="fr-header">{header}</h2>"#))
        .unwrap_or_default();
    let body = units
        .iter()
        .map(|unit| unit.html.as_str())
        .collect::<Vec<_>>()
        .join("<br>");
    format!(r#"<form id="{FORM_ID}" class="fr-login" method="post"{stage}>{header}{body}</form>"#)
}
