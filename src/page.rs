//! HTML pages. Every dynamic value is escaped for the context it lands in.
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::user::User;

pub fn login(auth_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Google Login Example</title>
</head>
<body>
  <h2>Login with Google</h2>
  <a href="{}">Login with Google</a>
</body>
</html>"#,
        encode_double_quoted_attribute(auth_url)
    )
}

pub fn dashboard(user: &User) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <title>Dashboard</title>
</head>
<body>
  <h1>Welcome, {}!</h1>
  <p>Email: {}</p>
  <img src="{}" alt="Profile Picture">
  <br><br>
  <a href="/logout">Logout</a>
</body>
</html>"#,
        encode_text(&user.name),
        encode_text(&user.email),
        encode_double_quoted_attribute(&user.picture),
    )
}
