use std::time::Duration;
use tracing::debug;

use super::authenticate::value_text;
use super::{html, AuthExchange, CallbackDescriptor, CallbackKind, ForgeRockError};

/// One piece of markup, tagged with the callback it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUnit {
    pub index: usize,
    pub html: String,
}

/// A wait the server asked for via `PollingWaitCallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingWait {
    pub index: usize,
    pub wait: Duration,
}

/// A complete login form, ready to be mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedForm {
    pub html: String,
    pub units: Vec<RenderedUnit>,
    pub stage: Option<String>,
    pub polling: Option<PollingWait>,
}

/// Where a `RedirectCallback` sends the browser, and with what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectForm {
    pub url: String,
    pub method: String,
    pub fields: Vec<(String, String)>,
}

impl RedirectForm {
    /// An auto-submitting form for targets that only deal in markup.
    pub fn to_html(&self) -> String {
        html::redirect_document(self)
    }
}

/// The result of rendering one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedPage {
    Form(RenderedForm),
    /// The page is leaving. Nothing else was rendered.
    Redirect(RedirectForm),
}

/// Turns callbacks into markup, one method per callback type.
///
/// Every method has a default built on [`html`], so an implementation only
/// needs to override the callbacks it wants to look different. An override
/// can still call the matching `html` function and decorate its output.
pub trait Renderer: Send + Sync {
    fn name_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<String, ForgeRockError> {
        Ok(html::name_callback(index, callback))
    }

    fn password_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<String, ForgeRockError> {
        Ok(html::password_callback(index, callback))
    }

    fn text_input_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<String, ForgeRockError> {
        Ok(html::text_input_callback(index, callback))
    }

    fn text_output_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<String, ForgeRockError> {
        html::text_output_callback(index, callback)
    }

    /// One unit per option.
    fn confirmation_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<Vec<String>, ForgeRockError> {
        html::confirmation_callback(index, callback)
    }

    fn choice_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<String, ForgeRockError> {
        html::choice_callback(index, callback)
    }

    fn hidden_value_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<String, ForgeRockError> {
        Ok(html::hidden_value_callback(index, callback))
    }

    fn redirect_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<RedirectForm, ForgeRockError> {
        html::redirect_callback(index, callback)
    }

    fn polling_wait_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<String, ForgeRockError> {
        Ok(html::polling_wait_callback(index, callback))
    }

    /// `sole_interactive` is set when no other callback on the page needs the user.
    fn recaptcha_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
        sole_interactive: bool,
    ) -> Result<String, ForgeRockError> {
        html::recaptcha_callback(index, callback, sole_interactive)
    }

    /// Types we know nothing about get a plain text field.
    fn unknown_callback(
        &self,
        index: usize,
        callback: &CallbackDescriptor,
    ) -> Result<String, ForgeRockError> {
        self.name_callback(index, callback)
    }

    fn form(&self, exchange: &AuthExchange, units: &[RenderedUnit]) -> String {
        html::form(exchange.header.as_deref(), exchange.stage.as_deref(), units)
    }
}

/// The stock markup for everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderer;

impl Renderer for DefaultRenderer {}

/// Renders every callback of the exchange, in order.
///
/// If nothing on the page lets the user move on (a confirmation, a polling
/// wait or a redirect), a "Login" button is added after everything else.
/// That button is never added to the exchange itself.
pub fn render_callbacks(
    renderer: &dyn Renderer,
    exchange: &AuthExchange,
) -> Result<RenderedPage, ForgeRockError> {
    let callbacks = &exchange.callbacks;
    let needs_login_button = !callbacks.iter().any(|callback| callback.kind().ends_page());
    let sole_interactive = !callbacks
        .iter()
        .any(|callback| callback.kind().is_interactive());

    let login_button =
        needs_login_button.then(|| CallbackDescriptor::login_button(callbacks.len()));
    let plan = callbacks.iter().chain(login_button.iter()).enumerate();

    let mut units = Vec::with_capacity(callbacks.len() + 1);
    let mut polling = None;
    for (index, callback) in plan {
        let unit = |html: String| RenderedUnit { index, html };
        match callback.kind() {
            CallbackKind::Name => units.push(unit(renderer.name_callback(index, callback)?)),
            CallbackKind::Password => {
                units.push(unit(renderer.password_callback(index, callback)?))
            }
            CallbackKind::TextInput => {
                units.push(unit(renderer.text_input_callback(index, callback)?))
            }
            CallbackKind::TextOutput => {
                units.push(unit(renderer.text_output_callback(index, callback)?))
            }
            CallbackKind::Confirmation => units.extend(
                renderer
                    .confirmation_callback(index, callback)?
                    .into_iter()
                    .map(unit),
            ),
            CallbackKind::Choice => units.push(unit(renderer.choice_callback(index, callback)?)),
            CallbackKind::HiddenValue => {
                units.push(unit(renderer.hidden_value_callback(index, callback)?))
            }
            CallbackKind::Redirect => {
                let redirect = renderer.redirect_callback(index, callback)?;
                debug!(index, url = %redirect.url, "redirect requested, rendering stops");
                return Ok(RenderedPage::Redirect(redirect));
            }
            CallbackKind::PollingWait => {
                units.push(unit(renderer.polling_wait_callback(index, callback)?));
                polling = Some(PollingWait {
                    index,
                    wait: wait_time(index, callback)?,
                });
            }
            CallbackKind::ReCaptcha => units.push(unit(renderer.recaptcha_callback(
                index,
                callback,
                sole_interactive,
            )?)),
            CallbackKind::Unknown => {
                debug!(index, callback_type = %callback.callback_type, "unknown callback type");
                units.push(unit(renderer.unknown_callback(index, callback)?))
            }
        }
    }

    Ok(RenderedPage::Form(RenderedForm {
        html: renderer.form(exchange, &units),
        units,
        stage: exchange.stage.clone(),
        polling,
    }))
}

/// `waitTime` is in milliseconds, sent either as a number or a string.
fn wait_time(index: usize, callback: &CallbackDescriptor) -> Result<Duration, ForgeRockError> {
    let wait_time = callback.required_output(index, "waitTime")?;
    value_text(wait_time)
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ForgeRockError::InvalidOutput {
            callback_type: callback.callback_type.clone(),
            index,
            name: "waitTime",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn exchange(value: Value) -> AuthExchange {
        serde_json::from_value(value).expect("should be able to parse exchange")
    }

    fn render(value: Value) -> RenderedForm {
        match render_callbacks(&DefaultRenderer, &exchange(value)).expect("should render") {
            RenderedPage::Form(form) => form,
            RenderedPage::Redirect(redirect) => panic!("unexpected redirect: {redirect:?}"),
        }
    }

    #[test]
    fn name_callback_gets_a_login_button() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [{
                "type": "NameCallback",
                "input": [{ "name": "IDToken1", "value": "" }],
                "output": [{ "name": "prompt", "value": "User Name:" }]
            }]
        }));

        assert_eq!(form.units.len(), 2);
        assert!(form.units[0].html.contains(r#"type="text""#));
        assert!(form.units[0].html.contains(r#"placeholder="User Name""#));
        assert!(form.units[0].html.contains(r#"name="callback_0""#));

        assert_eq!(form.units[1].index, 1);
        assert!(form.units[1].html.contains(">Login</button>"));
        assert!(form.units[1].html.contains(r#"data-default="true""#));

        assert!(form.html.starts_with(r#"<form id="fr-login-form""#));
        assert_eq!(form.html.matches("<br>").count(), 1);
        assert!(form.polling.is_none());
    }

    #[test]
    fn login_button_comes_after_everything_else() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [
                { "type": "NameCallback", "output": [{ "name": "prompt", "value": "User Name" }], "input": [{ "name": "IDToken1", "value": "" }] },
                { "type": "PasswordCallback", "output": [{ "name": "prompt", "value": "Password" }], "input": [{ "name": "IDToken2", "value": "" }] },
                { "type": "HiddenValueCallback", "output": [{ "name": "id", "value": "clientScriptOutputData" }], "input": [{ "name": "IDToken3", "value": "x" }] }
            ]
        }));

        let indexes: Vec<usize> = form.units.iter().map(|unit| unit.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
        assert!(form.units[1].html.contains(r#"type="password""#));
        assert!(form.units[2].html.contains(r#"id="clientScriptOutputData""#));
        assert_eq!(form.html.matches(">Login</button>").count(), 1);
        assert!(form.html.ends_with(">Login</button></form>"));
    }

    #[test]
    fn existing_confirmation_means_no_login_button() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [{
                "type": "ConfirmationCallback",
                "output": [
                    { "name": "prompt", "value": "" },
                    { "name": "options", "value": ["Submit", "Cancel", "Help"] },
                    { "name": "defaultOption", "value": 1 }
                ],
                "input": [{ "name": "IDToken1", "value": 0 }]
            }]
        }));

        assert_eq!(form.units.len(), 3);
        assert!(!form.html.contains(">Login<"));
        assert!(!form.units[0].html.contains("data-default"));
        assert!(form.units[1].html.contains(r#"value="1""#));
        assert!(form.units[1].html.contains(r#"data-default="true""#));
        assert!(!form.units[2].html.contains("data-default"));
    }

    #[test]
    fn single_option_is_always_default() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [{
                "type": "ConfirmationCallback",
                "output": [
                    { "name": "options", "value": ["Continue"] },
                    { "name": "defaultOption", "value": 3 }
                ],
                "input": [{ "name": "IDToken1", "value": 0 }]
            }]
        }));

        assert_eq!(form.units.len(), 1);
        assert!(form.units[0].html.contains(r#"data-default="true""#));
    }

    #[test]
    fn script_messages_are_emitted_verbatim() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [{
                "type": "TextOutputCallback",
                "output": [
                    { "name": "message", "value": "var x = \"<b>\" && 1;" },
                    { "name": "messageType", "value": "4" }
                ]
            }]
        }));

        assert_eq!(form.units[0].html, "<script>var x = \"<b>\" && 1;</script>");
    }

    #[test]
    fn messages_are_tagged_by_severity() {
        for (message_type, severity) in [("0", "informational"), ("1", "warning"), ("2", "error")] {
            let form = render(json!({
                "authId": "abc",
                "callbacks": [{
                    "type": "TextOutputCallback",
                    "output": [
                        { "name": "message", "value": "Heads up" },
                        { "name": "messageType", "value": message_type }
                    ]
                }]
            }));
            let unit = &form.units[0].html;
            assert!(!unit.contains("<script>"));
            assert!(unit.contains(&format!(r#"data-severity="{severity}""#)));
            assert!(unit.contains(">Heads up</div>"));
        }
    }

    #[test]
    fn choice_preselects_the_current_input() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [{
                "type": "ChoiceCallback",
                "output": [
                    { "name": "prompt", "value": "Delivery method" },
                    { "name": "choices", "value": ["Email", "SMS"] },
                    { "name": "defaultChoice", "value": 0 }
                ],
                "input": [{ "name": "IDToken1", "value": 1 }]
            }]
        }));

        let unit = &form.units[0].html;
        assert!(unit.contains(r#"<option value="0">Email</option>"#));
        assert!(unit.contains(r#"<option value="1" selected>SMS</option>"#));
    }

    #[test]
    fn unknown_types_fall_back_to_text_fields() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [{
                "type": "MadeUpCallback",
                "output": [{ "name": "prompt", "value": "Favourite colour:" }],
                "input": [{ "name": "IDToken1", "value": "blue" }]
            }]
        }));

        let unit = &form.units[0].html;
        assert!(unit.contains(r#"type="text""#));
        assert!(unit.contains(r#"placeholder="Favourite colour""#));
        assert!(unit.contains(r#"value="blue""#));
    }

    #[test]
    fn polling_waits_are_scheduled_without_a_login_button() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [{
                "type": "PollingWaitCallback",
                "output": [
                    { "name": "waitTime", "value": "8000" },
                    { "name": "message", "value": "Waiting for approval..." }
                ]
            }]
        }));

        assert_eq!(form.units.len(), 1);
        assert!(form.units[0].html.contains("Waiting for approval..."));
        assert_eq!(
            form.polling,
            Some(PollingWait {
                index: 0,
                wait: Duration::from_millis(8000)
            })
        );
    }

    #[test]
    fn redirects_stop_rendering() {
        let page = render_callbacks(
            &DefaultRenderer,
            &exchange(json!({
                "authId": "abc",
                "callbacks": [
                    { "type": "TextOutputCallback", "output": [{ "name": "message", "value": "Bye" }] },
                    {
                        "type": "RedirectCallback",
                        "output": [
                            { "name": "redirectUrl", "value": "https://idp.example.com/sso" },
                            { "name": "redirectMethod", "value": "POST" },
                            { "name": "redirectData", "value": { "SAMLRequest": "abc" } }
                        ]
                    }
                ]
            })),
        )
        .expect("should render");

        let RenderedPage::Redirect(redirect) = page else {
            panic!("expected a redirect");
        };
        assert_eq!(redirect.url, "https://idp.example.com/sso");
        assert_eq!(redirect.method, "POST");
        assert_eq!(
            redirect.fields,
            vec![("SAMLRequest".to_string(), "abc".to_string())]
        );
        let html = redirect.to_html();
        assert!(html.contains(r#"action="https://idp.example.com/sso""#));
        assert!(html.contains(r#"<input type="hidden" name="SAMLRequest" value="abc">"#));
        assert!(html.contains(".submit();"));
    }

    #[test]
    fn lone_recaptcha_submits_itself() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [{
                "type": "ReCaptchaCallback",
                "output": [{ "name": "recaptchaSiteKey", "value": "ignored" }, { "name": "siteKey", "value": "6Lc-key" }],
                "input": [{ "name": "IDToken1", "value": "" }]
            }]
        }));

        let unit = &form.units[0].html;
        assert!(unit.contains(r#"data-sitekey="6Lc-key""#));
        assert!(unit.contains(r#"name="callback_0""#));
        assert!(unit.contains("requestSubmit()"));
        assert!(unit.contains(r#"button.style.display = "none""#));
    }

    #[test]
    fn recaptcha_next_to_inputs_waits_for_login() {
        let form = render(json!({
            "authId": "abc",
            "callbacks": [
                { "type": "NameCallback", "output": [{ "name": "prompt", "value": "User Name" }], "input": [{ "name": "IDToken1", "value": "" }] },
                { "type": "ReCaptchaCallback", "output": [{ "name": "siteKey", "value": "6Lc-key" }], "input": [{ "name": "IDToken2", "value": "" }] }
            ]
        }));

        let unit = &form.units[1].html;
        assert!(!unit.contains("requestSubmit()"));
        assert!(!unit.contains("display"));
    }

    #[test]
    fn header_and_stage_decorate_the_form() {
        let form = render(json!({
            "authId": "abc",
            "header": "Sign in",
            "stage": "DataStore1",
            "callbacks": []
        }));

        assert!(form.html.contains(r#"data-stage="DataStore1""#));
        assert!(form.html.contains(r#"<h2 class="fr-header">Sign in</h2>"#));
        assert_eq!(form.stage.as_deref(), Some("DataStore1"));
    }

    #[test]
    fn missing_structural_outputs_are_errors() {
        let result = render_callbacks(
            &DefaultRenderer,
            &exchange(json!({
                "authId": "abc",
                "callbacks": [{ "type": "ChoiceCallback", "output": [], "input": [] }]
            })),
        );
        assert!(matches!(
            result,
            Err(ForgeRockError::MissingOutput { index: 0, name: "choices", .. })
        ));
    }

    struct ShoutingRenderer;

    impl Renderer for ShoutingRenderer {
        fn name_callback(
            &self,
            index: usize,
            callback: &CallbackDescriptor,
        ) -> Result<String, ForgeRockError> {
            Ok(format!(
                "<div class=\"shout\">{}</div>",
                html::name_callback(index, callback)
            ))
        }
    }

    #[test]
    fn renderers_can_decorate_the_defaults() {
        let form = match render_callbacks(
            &ShoutingRenderer,
            &exchange(json!({
                "authId": "abc",
                "callbacks": [
                    { "type": "NameCallback", "output": [{ "name": "prompt", "value": "User Name" }], "input": [{ "name": "IDToken1", "value": "" }] },
                    { "type": "PasswordCallback", "output": [{ "name": "prompt", "value": "Password" }], "input": [{ "name": "IDToken2", "value": "" }] }
                ]
            })),
        )
        .expect("should render")
        {
            RenderedPage::Form(form) => form,
            RenderedPage::Redirect(_) => panic!("unexpected redirect"),
        };

        assert!(form.units[0].html.starts_with("<div class=\"shout\"><div class=\"form-group\">"));
        assert!(!form.units[1].html.contains("shout"));
    }
}
