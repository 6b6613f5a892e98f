use std::fmt;

use crate::{
    client::{AuthRequest, Product},
    config::FormVariant,
    form::{FormFields, Mode},
    session::Session,
    validation::ValidationErrors,
};

pub use message::Msg;

pub mod message;
pub mod update;

/// Identifies an authentication request, so that a late response to a
/// cancelled or superseded request can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Where the form is in its submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Submission {
    #[default]
    Idle,
    Pending(RequestId),
    Settled(Outcome),
}

impl Submission {
    pub fn is_pending(&self) -> bool {
        matches!(self, Submission::Pending(_))
    }
}

/// Side effect requested by a state transition, to be run by the caller.
/// Its result, if any, is fed back as a [`Msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    None,
    Batch(Vec<Command>),
    Authenticate { id: RequestId, request: AuthRequest },
    FetchProducts(Session),
    StoreSession(Session),
    ClearSession,
}

impl Command {
    /// Flatten into the list of effects to run, in order.
    pub fn into_vec(self) -> Vec<Command> {
        match self {
            Command::None => Vec::new(),
            Command::Batch(cmds) => cmds.into_iter().flat_map(Command::into_vec).collect(),
            cmd => vec![cmd],
        }
    }
}

/// A snapshot of the form.
///
/// Snapshots are never mutated in place by callers: [`State::update`] consumes
/// one and returns the next.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub variant: FormVariant,
    pub mode: Mode,
    pub fields: FormFields,
    pub errors: ValidationErrors,
    pub submission: Submission,
    pub session: Option<Session>,
    pub products: Vec<Product>,
    last_request: u64,
}

impl State {
    /// The initial snapshot, with the session read from the store at startup.
    pub fn new(variant: FormVariant, session: Option<Session>) -> (Self, Command) {
        // The local form never authenticates, a persisted session is not its business.
        let session = session.filter(|_| variant == FormVariant::Remote);
        let cmd = session
            .clone()
            .map(Command::FetchProducts)
            .unwrap_or(Command::None);
        let state = Self {
            variant,
            session,
            ..Default::default()
        };
        (state, cmd)
    }

    pub fn can_submit(&self) -> bool {
        !self.submission.is_pending()
    }

    pub fn can_toggle_mode(&self) -> bool {
        self.variant.allows_mode_switch()
    }

    fn next_request_id(&mut self) -> RequestId {
        self.last_request += 1;
        RequestId(self.last_request)
    }
}
