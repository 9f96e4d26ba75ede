use serde::Serialize;

use crate::screen::classifier::{ClassifiedElement, ElementCategory, LoginFieldKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoginSignal {
    PasswordField(String),
    EmailField(String),
    LoginButton(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginAssessment {
    pub is_login_screen: bool,
    pub signals: Vec<LoginSignal>,
}

/// A screen is a login screen when a password field co-occurs with an email
/// field or a login button.
pub fn assess_login(elements: &[ClassifiedElement]) -> LoginAssessment {
    let mut signals = Vec::new();
    let (mut password, mut email, mut button) = (false, false, false);

    for c in elements {
        let ElementCategory::LoginField(kind) = c.category else {
            continue;
        };
        let id = c.element.id.clone();

        match kind {
            LoginFieldKind::Password => {
                password = true;
                signals.push(LoginSignal::PasswordField(id));
            }
            LoginFieldKind::Email => {
                email = true;
                signals.push(LoginSignal::EmailField(id));
            }
            LoginFieldKind::LoginButton => {
                button = true;
                signals.push(LoginSignal::LoginButton(id));
            }
        }
    }

    LoginAssessment {
        is_login_screen: password && (email || button),
        signals,
    }
}
