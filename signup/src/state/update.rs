use tracing::{debug, info, warn};

use super::{message::Msg, Command, Outcome, RequestId, State, Submission};
use crate::{
    client::{AuthRequest, ClientError, Product},
    config::FormVariant,
    form::{Field, FormFields},
    session::Session,
    validation::{validate, ValidationErrors},
};

// Update routing logic
impl State {
    #[rustfmt::skip]
    pub fn update(mut self, message: Msg) -> (State, Command) {
        let cmd = match message {
            // User input
            Msg::UpdateField(field, value) => self.on_update_field(field, value),
            Msg::ToggleMode => self.on_toggle_mode(),
            Msg::Submit => self.on_submit(),
            Msg::CancelSubmit => self.on_cancel_submit(),
            Msg::Logout => self.on_logout(),

            // Network
            Msg::Authenticated(id, result) => self.on_authenticated(id, result),
            Msg::ProductsLoaded(session, result) => self.on_products_loaded(session, result),
        };
        (self, cmd)
    }

    fn on_update_field(&mut self, field: Field, value: String) -> Command {
        self.fields.set(field, value);
        // Optimistic: the field is only checked again on the next submit.
        self.errors.clear_field(field);
        Command::None
    }

    fn on_toggle_mode(&mut self) -> Command {
        if !self.can_toggle_mode() {
            debug!("Mode switching is disabled for the {:?} form", self.variant);
            return Command::None;
        }
        self.mode = self.mode.toggled();
        // Values are kept, errors computed for the other mode are dropped.
        self.errors = ValidationErrors::default();
        debug!("Switched form to {:?} mode", self.mode);
        Command::None
    }

    fn on_submit(&mut self) -> Command {
        if let Submission::Pending(id) = self.submission {
            warn!("Submission {} still in flight, ignoring submit", id);
            return Command::None;
        }

        self.errors = validate(&self.fields, self.mode);
        if !self.errors.is_empty() {
            debug!(
                "Form is invalid: {:?}",
                self.errors.iter().map(|(f, _)| f).collect::<Vec<_>>()
            );
            return Command::None;
        }

        let request = AuthRequest::new(&self.fields, self.mode);
        match self.variant {
            FormVariant::Local => {
                info!("Form submitted: {:?}", request);
                self.reset_form();
                self.submission = Submission::Settled(Outcome::Succeeded);
                Command::None
            }
            FormVariant::Remote => {
                let id = self.next_request_id();
                debug!("Sending {} for {}", id, request.email());
                self.submission = Submission::Pending(id);
                Command::Authenticate { id, request }
            }
        }
    }

    fn on_cancel_submit(&mut self) -> Command {
        if let Submission::Pending(id) = self.submission {
            info!("Submission {} cancelled", id);
            self.submission = Submission::Idle;
        }
        Command::None
    }

    fn on_authenticated(
        &mut self,
        id: RequestId,
        result: Result<Session, ClientError>,
    ) -> Command {
        if self.submission != Submission::Pending(id) {
            debug!("Ignoring response to stale submission {}", id);
            return Command::None;
        }

        match result {
            Ok(session) => {
                info!("Authenticated");
                self.reset_form();
                self.submission = Submission::Settled(Outcome::Succeeded);
                self.session = Some(session.clone());
                Command::Batch(vec![
                    Command::StoreSession(session.clone()),
                    Command::FetchProducts(session),
                ])
            }
            Err(e) => {
                warn!("Submission {} failed: {}", id, e);
                self.errors = ValidationErrors::submission(e.user_message());
                self.submission = Submission::Settled(Outcome::Failed);
                Command::None
            }
        }
    }

    fn on_products_loaded(
        &mut self,
        session: Session,
        result: Result<Vec<Product>, ClientError>,
    ) -> Command {
        if self.session.as_ref() != Some(&session) {
            debug!("Ignoring products fetched with a previous session");
            return Command::None;
        }
        match result {
            Ok(products) => {
                debug!("Fetched {} products", products.len());
                self.products = products;
            }
            // TODO: surface this to the user once a product decision is made, the list
            // silently stays as it was for now.
            Err(e) => warn!("Error fetching products: {}", e),
        }
        Command::None
    }

    fn on_logout(&mut self) -> Command {
        if self.session.take().is_none() {
            return Command::None;
        }
        info!("Logged out");
        self.products.clear();
        Command::ClearSession
    }

    fn reset_form(&mut self) {
        self.fields = FormFields::default();
        self.errors = ValidationErrors::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Mode;

    fn product(id: &str, title: &str) -> Product {
        Product {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    fn session(token: &str) -> Session {
        Session::new(token.to_string())
    }

    fn fill(mut state: State, values: &[(Field, &str)]) -> State {
        for (field, value) in values {
            let (next, cmd) = state.update(Msg::UpdateField(*field, value.to_string()));
            assert_eq!(cmd, Command::None);
            state = next;
        }
        state
    }

    fn registered() -> State {
        fill(
            State::default(),
            &[
                (Field::FullName, "Ada Lovelace"),
                (Field::Email, "ada@example.com"),
                (Field::Phone, "1234567890"),
                (Field::Password, "abcdef"),
                (Field::ConfirmPassword, "abcdef"),
            ],
        )
    }

    fn pending_id(cmd: &Command) -> RequestId {
        match cmd {
            Command::Authenticate { id, .. } => *id,
            cmd => panic!("expected an authentication request, got {:?}", cmd),
        }
    }

    #[test]
    fn startup() {
        let (state, cmd) = State::new(FormVariant::Remote, None);
        assert_eq!(cmd, Command::None);
        assert_eq!(state.mode, Mode::Register);
        assert_eq!(state.submission, Submission::Idle);

        let (state, cmd) = State::new(FormVariant::Remote, Some(session("tok")));
        assert_eq!(cmd, Command::FetchProducts(session("tok")));
        assert_eq!(state.session, Some(session("tok")));

        let (state, cmd) = State::new(FormVariant::Local, Some(session("tok")));
        assert_eq!(cmd, Command::None);
        assert_eq!(state.session, None);
    }

    #[test]
    fn invalid_submit_sends_nothing() {
        let (state, cmd) = State::default().update(Msg::Submit);
        assert_eq!(cmd, Command::None);
        assert_eq!(state.submission, Submission::Idle);
        assert_eq!(state.errors.iter().count(), 5);
        assert_eq!(state.errors.get(Field::Email), Some("Email is required"));
    }

    #[test]
    fn editing_clears_only_that_field() {
        let (state, _) = State::default().update(Msg::Submit);
        let (state, _) = state.update(Msg::UpdateField(Field::Email, "a".to_string()));
        assert_eq!(state.errors.get(Field::Email), None);
        assert_eq!(state.errors.iter().count(), 4);
        assert_eq!(
            state.errors.get(Field::Password),
            Some("Password is required")
        );
        assert_eq!(state.fields.email, "a");
    }

    #[test]
    fn register_payload() {
        let (state, cmd) = registered().update(Msg::Submit);
        assert!(state.submission.is_pending());
        assert!(!state.can_submit());
        assert!(state.errors.is_empty());
        match cmd {
            Command::Authenticate { request, .. } => {
                assert_eq!(request.path(), "/api/auth/register");
                assert_eq!(
                    serde_json::to_value(&request).unwrap(),
                    serde_json::json!({
                        "fullName": "Ada Lovelace",
                        "email": "ada@example.com",
                        "phone": "1234567890",
                        "password": "abcdef",
                    })
                );
            }
            cmd => panic!("unexpected command {:?}", cmd),
        }
    }

    #[test]
    fn login_payload() {
        let (state, _) = State::default().update(Msg::ToggleMode);
        let state = fill(
            state,
            &[(Field::Email, "ada@example.com"), (Field::Password, "abcdef")],
        );
        let (_, cmd) = state.update(Msg::Submit);
        match cmd {
            Command::Authenticate { request, .. } => {
                assert_eq!(request.path(), "/api/auth/login");
                assert_eq!(
                    serde_json::to_value(&request).unwrap(),
                    serde_json::json!({"email": "ada@example.com", "password": "abcdef"})
                );
            }
            cmd => panic!("unexpected command {:?}", cmd),
        }
    }

    #[test]
    fn successful_submission() {
        let (state, cmd) = registered().update(Msg::Submit);
        let id = pending_id(&cmd);
        let (state, cmd) = state.update(Msg::Authenticated(id, Ok(session("tok-1"))));

        assert_eq!(state.fields, FormFields::default());
        assert!(state.errors.is_empty());
        assert_eq!(state.submission, Submission::Settled(Outcome::Succeeded));
        assert_eq!(state.session, Some(session("tok-1")));
        assert_eq!(
            cmd.into_vec(),
            vec![
                Command::StoreSession(session("tok-1")),
                Command::FetchProducts(session("tok-1")),
            ]
        );

        let (state, cmd) = state.update(Msg::ProductsLoaded(
            session("tok-1"),
            Ok(vec![product("1", "Keyboard"), product("2", "Mouse")]),
        ));
        assert_eq!(cmd, Command::None);
        assert_eq!(state.products.len(), 2);

        // Replaced, never merged.
        let (state, _) = state.update(Msg::ProductsLoaded(
            session("tok-1"),
            Ok(vec![product("3", "Desk")]),
        ));
        assert_eq!(state.products, vec![product("3", "Desk")]);
    }

    #[test]
    fn rejected_submission() {
        let before = registered();
        let (state, cmd) = before.clone().update(Msg::Submit);
        let id = pending_id(&cmd);
        let (state, cmd) = state.update(Msg::Authenticated(
            id,
            Err(ClientError::Server {
                status: 400,
                message: Some("User already exists".to_string()),
            }),
        ));
        assert_eq!(cmd, Command::None);
        assert_eq!(state.errors.submit(), Some("User already exists"));
        assert!(!state.errors.has_field_errors());
        assert_eq!(state.fields, before.fields);
        assert_eq!(state.session, None);
        assert_eq!(state.submission, Submission::Settled(Outcome::Failed));

        // The user can retry.
        let (state, cmd) = state.update(Msg::Submit);
        assert!(state.errors.is_empty());
        assert_ne!(pending_id(&cmd), id);
    }

    #[test]
    fn transport_failure() {
        let (state, cmd) = registered().update(Msg::Submit);
        let id = pending_id(&cmd);
        let (state, _) = state.update(Msg::Authenticated(
            id,
            Err(ClientError::Transport("connection refused".to_string())),
        ));
        assert_eq!(state.errors.submit(), Some("Server error"));
        assert_eq!(state.fields.email, "ada@example.com");
    }

    #[test]
    fn no_double_submit() {
        let (state, cmd) = registered().update(Msg::Submit);
        let id = pending_id(&cmd);
        let (state, cmd) = state.update(Msg::Submit);
        assert_eq!(cmd, Command::None);
        assert_eq!(state.submission, Submission::Pending(id));
    }

    #[test]
    fn cancelled_submission() {
        let (state, cmd) = registered().update(Msg::Submit);
        let id = pending_id(&cmd);
        let (state, _) = state.update(Msg::CancelSubmit);
        assert_eq!(state.submission, Submission::Idle);

        // The late response is ignored.
        let (state, cmd) = state.update(Msg::Authenticated(id, Ok(session("tok-1"))));
        assert_eq!(cmd, Command::None);
        assert_eq!(state.session, None);
        assert_eq!(state.fields.email, "ada@example.com");

        // So is the one of a superseded request.
        let (state, cmd) = state.update(Msg::Submit);
        let second = pending_id(&cmd);
        let (state, _) = state.update(Msg::Authenticated(id, Ok(session("tok-1"))));
        assert_eq!(state.submission, Submission::Pending(second));
        let (state, _) = state.update(Msg::Authenticated(second, Ok(session("tok-2"))));
        assert_eq!(state.session, Some(session("tok-2")));
    }

    #[test]
    fn toggle_mode_keeps_values_and_clears_errors() {
        let state = fill(State::default(), &[(Field::Email, "ada@example.com")]);
        let (state, _) = state.update(Msg::Submit);
        assert!(state.errors.has_field_errors());

        let (state, cmd) = state.update(Msg::ToggleMode);
        assert_eq!(cmd, Command::None);
        assert_eq!(state.mode, Mode::Login);
        assert!(state.errors.is_empty());
        assert_eq!(state.fields.email, "ada@example.com");

        let (state, _) = state.update(Msg::ToggleMode);
        assert_eq!(state.mode, Mode::Register);
        assert_eq!(state.fields.email, "ada@example.com");
    }

    #[test]
    fn toggle_mode_clears_submit_error() {
        let (state, cmd) = registered().update(Msg::Submit);
        let id = pending_id(&cmd);
        let (state, _) = state.update(Msg::Authenticated(
            id,
            Err(ClientError::Transport("timeout".to_string())),
        ));
        let (state, _) = state.update(Msg::ToggleMode);
        assert_eq!(state.errors.submit(), None);
    }

    #[test]
    fn local_form() {
        let (state, _) = State::new(FormVariant::Local, None);
        let (state, _) = state.update(Msg::ToggleMode);
        assert_eq!(state.mode, Mode::Register);
        assert!(!state.can_toggle_mode());

        let state = fill(
            state,
            &[
                (Field::FullName, "Ada Lovelace"),
                (Field::Email, "ada@example.com"),
                (Field::Phone, "1234567890"),
                (Field::Password, "abcdef"),
                (Field::ConfirmPassword, "abcdef"),
            ],
        );
        let (state, cmd) = state.update(Msg::Submit);
        assert_eq!(cmd, Command::None);
        assert_eq!(state.submission, Submission::Settled(Outcome::Succeeded));
        assert_eq!(state.fields, FormFields::default());
        assert_eq!(state.session, None);
    }

    #[test]
    fn product_fetch_failure_keeps_list() {
        let (state, _) = State::new(FormVariant::Remote, Some(session("tok")));
        let (state, _) = state.update(Msg::ProductsLoaded(
            session("tok"),
            Ok(vec![product("1", "Keyboard")]),
        ));
        let (state, cmd) = state.update(Msg::ProductsLoaded(
            session("tok"),
            Err(ClientError::Server {
                status: 401,
                message: None,
            }),
        ));
        assert_eq!(cmd, Command::None);
        assert_eq!(state.products, vec![product("1", "Keyboard")]);
        assert!(state.errors.is_empty());
    }

    #[test]
    fn logout() {
        let (state, _) = State::new(FormVariant::Remote, Some(session("tok")));
        let state = fill(state, &[(Field::Email, "ada@example.com")]);
        let (state, _) = state.update(Msg::ProductsLoaded(
            session("tok"),
            Ok(vec![product("1", "Keyboard")]),
        ));

        let (state, cmd) = state.update(Msg::Logout);
        assert_eq!(cmd, Command::ClearSession);
        assert_eq!(state.session, None);
        assert!(state.products.is_empty());
        assert_eq!(state.fields.email, "ada@example.com");

        // Products fetched before the logout are dropped.
        let (state, _) = state.update(Msg::ProductsLoaded(
            session("tok"),
            Ok(vec![product("1", "Keyboard")]),
        ));
        assert!(state.products.is_empty());

        let (_, cmd) = state.update(Msg::Logout);
        assert_eq!(cmd, Command::None);
    }
}
