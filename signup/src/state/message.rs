use crate::{
    client::{ClientError, Product},
    form::Field,
    session::Session,
};

use super::RequestId;

/// All events the form reacts to.
#[derive(Debug, Clone)]
pub enum Msg {
    // User input
    UpdateField(Field, String),
    ToggleMode,
    Submit,
    CancelSubmit,
    Logout,

    // Network
    Authenticated(RequestId, Result<Session, ClientError>),
    /// Products fetched with the given session.
    ProductsLoaded(Session, Result<Vec<Product>, ClientError>),
}
