use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

/// Holds the long-lived refresh credential. HttpOnly and path-scoped to the
/// refresh endpoint: page script can never read it, and the browser only
/// sends it where it is needed.
pub(super) const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Records whether the user asked to be remembered at login.
pub(super) const REMEMBER_COOKIE_NAME: &str = "remember_user";

/// Create the refresh + remember cookies set by a successful login.
///
/// With `remember` both cookies persist for `ttl_days`; without it they are
/// session cookies that die with the browser.
pub(super) fn session_cookies(
    refresh_token: &str,
    remember: bool,
    secure: bool,
    refresh_path: &str,
    ttl_days: i64,
) -> (Cookie<'static>, Cookie<'static>) {
    let mut refresh = Cookie::build((REFRESH_COOKIE_NAME, refresh_token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(refresh_path.to_string());
    if remember {
        refresh = refresh.max_age(Duration::days(ttl_days));
    }

    let mut remember_flag = Cookie::build((REMEMBER_COOKIE_NAME, remember.to_string()))
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(refresh_path.to_string());
    if remember {
        remember_flag = remember_flag.max_age(Duration::days(ttl_days));
    }

    (refresh.build(), remember_flag.build())
}

/// Create removal cookies for logout: values emptied, expiry at the Unix
/// epoch so the browser deletes them.
pub(super) fn clear_session_cookies(refresh_path: &str) -> (Cookie<'static>, Cookie<'static>) {
    let refresh = Cookie::build((REFRESH_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path(refresh_path.to_string())
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build();

    let remember_flag = Cookie::build((REMEMBER_COOKIE_NAME, ""))
        .same_site(SameSite::Lax)
        .path(refresh_path.to_string())
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build();

    (refresh, remember_flag)
}
