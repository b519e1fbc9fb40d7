//! GraphQL documents and variable builders for each operation.
//!
//! Request building is plain field-to-JSON mapping; all response
//! interpretation lives in [`normalize`](crate::normalize).

use serde_json::{json, Value};

use crate::types::{Session, SignUpInput, UserProfile};

pub(crate) const SIGN_IN: &str = "\
mutation SignIn($email: String!, $password: String!) {
  signIn(email: $email, password: $password) {
    accessToken refreshToken idToken expiresIn
    user { id email displayName emailVerified createdAt metadata }
  }
}";

pub(crate) const SIGN_UP: &str = "\
mutation SignUp($input: SignUpInput!) {
  signUp(input: $input) {
    accessToken refreshToken idToken expiresIn
    user { id email displayName emailVerified createdAt metadata }
  }
}";

pub(crate) const SIGN_OUT: &str = "\
mutation SignOut {
  signOut
}";

pub(crate) const CURRENT_SESSION: &str = "\
query CurrentSession {
  session {
    accessToken refreshToken idToken expiresIn
    user { id email displayName emailVerified createdAt metadata }
  }
}";

pub(crate) const VIEWER: &str = "\
query Viewer {
  viewer { id email displayName emailVerified createdAt metadata }
}";

pub(crate) fn sign_in_variables(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

pub(crate) fn sign_up_variables(input: &SignUpInput) -> Value {
    json!({ "input": input })
}

// Typed `data` shapes, one per operation. All derive `Default` so the
// normalizer's lenient success path has a value to fall back to.

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct SignInData {
    #[serde(rename = "signIn", default)]
    pub sign_in: Session,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct SignUpData {
    #[serde(rename = "signUp", default)]
    pub sign_up: Session,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct SignOutData {
    #[serde(rename = "signOut", default)]
    pub sign_out: bool,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct SessionData {
    #[serde(default)]
    pub session: Session,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ViewerData {
    #[serde(default)]
    pub viewer: Option<UserProfile>,
}
