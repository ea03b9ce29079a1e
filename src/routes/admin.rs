use rocket::{form::Form, http::CookieJar, response::Redirect, State};
use rocket_dyn_templates::{context, Template};
use tracing::{info, warn};

use crate::{
    auth,
    config::AppConfig,
    error::AppError,
    session::{session_cookie, AdminIdentity, AdminSession, SESSION_COOKIE},
    store::Stores,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

#[derive(FromForm)]
pub struct LoginForm {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Responder)]
pub enum LoginPage {
    Redirect(Redirect),
    Form(Template),
}

fn login_form(error: Option<&str>) -> Template {
    Template::render("admin_login", context! { error: error })
}

#[get("/admin/login")]
pub fn login_page(session: Option<AdminSession>) -> LoginPage {
    match session {
        Some(_) => LoginPage::Redirect(Redirect::to(uri!("/admin/dashboard"))),
        None => LoginPage::Form(login_form(None)),
    }
}

#[post("/admin/login", data = "<form>")]
pub async fn login(
    form: Form<LoginForm>,
    jar: &CookieJar<'_>,
    stores: &State<Stores>,
    config: &State<AppConfig>,
) -> Result<LoginPage, AppError> {
    let form = form.into_inner();
    let email = form.email.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    let Some(admin) = auth::authenticate(stores.admins.as_ref(), &email, &password).await? else {
        warn!("Failed admin login for {email}");
        return Ok(LoginPage::Form(login_form(Some(INVALID_CREDENTIALS))));
    };

    let identity = AdminIdentity {
        id: admin.id,
        email: admin.email,
    };
    let session_id = stores.sessions.open(&identity).await?;
    jar.add_private(session_cookie(session_id, config.session_ttl));
    info!("Admin {} logged in", identity.email);

    Ok(LoginPage::Redirect(Redirect::to(uri!("/admin/dashboard"))))
}

#[get("/admin/logout")]
pub async fn logout(
    session: Option<AdminSession>,
    jar: &CookieJar<'_>,
    stores: &State<Stores>,
) -> Redirect {
    if let Some(session) = session {
        if let Err(e) = stores.sessions.close(&session.session_id).await {
            warn!("Could not drop session for {}: {e}", session.admin.email);
        }
    }
    jar.remove_private(SESSION_COOKIE);
    Redirect::to(uri!("/admin/login"))
}
