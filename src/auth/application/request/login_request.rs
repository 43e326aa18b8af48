use serde::Serialize;

/// Form body of `POST /access/ticket`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}
