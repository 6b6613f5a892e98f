use std::fmt;

/// One of the inputs of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    Email,
    Phone,
    Password,
    ConfirmPassword,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::FullName,
        Field::Email,
        Field::Phone,
        Field::Password,
        Field::ConfirmPassword,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::FullName => "Fullname",
            Field::Email => "Email",
            Field::Phone => "Phone",
            Field::Password => "Password",
            Field::ConfirmPassword => "Confirm Password",
        }
    }

    /// Whether the input must be masked when displayed.
    pub fn is_secret(&self) -> bool {
        matches!(self, Field::Password | Field::ConfirmPassword)
    }

    /// Whether the field is part of the form in the given mode.
    pub fn is_shown(&self, mode: Mode) -> bool {
        match mode {
            Mode::Login => matches!(self, Field::Email | Field::Password),
            Mode::Register => true,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::FullName => write!(f, "fullName"),
            Field::Email => write!(f, "email"),
            Field::Phone => write!(f, "phone"),
            Field::Password => write!(f, "password"),
            Field::ConfirmPassword => write!(f, "confirmPassword"),
        }
    }
}

/// Whether the form logs into an existing account or registers a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Login,
    #[default]
    Register,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Login => Mode::Register,
            Mode::Register => Mode::Login,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Mode::Login => "Login",
            Mode::Register => "Sign Up",
        }
    }

    /// Label of the control switching away from this mode.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Mode::Login => "Back to Sign Up",
            Mode::Register => "Switch to Login",
        }
    }

    /// Fields displayed in this mode, in display order.
    pub fn fields(self) -> impl Iterator<Item = Field> {
        [
            Field::FullName,
            Field::Phone,
            Field::ConfirmPassword,
            Field::Email,
            Field::Password,
        ]
        .into_iter()
        .filter(move |f| f.is_shown(self))
    }
}

/// Current values of the form inputs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FullName => &self.full_name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::FullName => self.full_name = value,
            Field::Email => self.email = value,
            Field::Phone => self.phone = value,
            Field::Password => self.password = value,
            Field::ConfirmPassword => self.confirm_password = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }
}

impl fmt::Debug for FormFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormFields")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"REDACTED")
            .field("confirm_password", &"REDACTED")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_per_mode() {
        assert_eq!(
            Mode::Login.fields().collect::<Vec<_>>(),
            vec![Field::Email, Field::Password]
        );
        assert_eq!(Mode::Register.fields().count(), 5);
        assert_eq!(Mode::default(), Mode::Register);
        assert_eq!(Mode::Login.toggled(), Mode::Register);
    }

    #[test]
    fn get_and_set() {
        let mut fields = FormFields::default();
        assert!(fields.is_empty());
        for (i, field) in Field::ALL.iter().enumerate() {
            fields.set(*field, i.to_string());
        }
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(fields.get(*field), i.to_string());
        }
        assert!(!fields.is_empty());
    }

    #[test]
    fn debug_hides_passwords() {
        let fields = FormFields {
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", fields).contains("hunter22"));
    }
}
