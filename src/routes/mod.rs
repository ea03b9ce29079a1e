use rocket::{response::Redirect, Route};

pub mod admin;
pub mod guests;
pub mod invite;

#[get("/")]
fn index() -> Redirect {
    Redirect::to(uri!("/admin/login"))
}

/// A failed [`AdminSession`](crate::session::AdminSession) guard lands here.
#[catch(401)]
fn unauthorized() -> Redirect {
    Redirect::to(uri!("/admin/login"))
}

#[catch(404)]
fn not_found() -> &'static str {
    "Page not found."
}

#[catch(500)]
fn server_error() -> &'static str {
    "Server error."
}

pub fn routes() -> Vec<Route> {
    routes![
        index,
        invite::invite,
        invite::submit,
        admin::login_page,
        admin::login,
        admin::logout,
        guests::dashboard,
        guests::create,
        guests::edit_form,
        guests::edit,
        guests::set_status,
        guests::delete,
    ]
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![unauthorized, not_found, server_error]
}
