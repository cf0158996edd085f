//! HTTP API handlers.
//!
//! Defines the Actix routes for triggers, catalog administration and device
//! selection, plus the form validation shared between them.

pub mod catalog;
pub mod health;
pub mod sessions;
pub mod trigger;

use actix_web::http::header;
use actix_web::{web, HttpResponse};

pub use catalog::{
    add_album,
    add_movie,
    delete_album,
    delete_movie,
    overview,
    search_movie,
    search_music,
};
pub use sessions::{clear_active_session, sessions_list, set_active_session};
pub use trigger::trigger_play;

/// A submitted form is missing required fields or carries an invalid value.
#[derive(Debug)]
pub struct ValidationError {
    missing: Vec<&'static str>,
    invalid: Option<(&'static str, &'static str)>,
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self {
            missing: Vec::new(),
            invalid: Some((field, reason)),
        }
    }

    /// Convert a validation error into an HTTP response.
    pub fn into_response(self) -> HttpResponse {
        if let Some((field, reason)) = self.invalid {
            return HttpResponse::BadRequest().body(format!("invalid {field}: {reason}"));
        }
        HttpResponse::BadRequest().body(format!("missing fields: {}", self.missing.join(", ")))
    }
}

/// Return the trimmed values of all fields, or every field that is blank.
pub(crate) fn require_fields<'a, const N: usize>(
    fields: [(&'static str, Option<&'a str>); N],
) -> Result<[&'a str; N], ValidationError> {
    let mut values = [""; N];
    let mut missing = Vec::new();
    for (slot, (name, value)) in values.iter_mut().zip(fields) {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => *slot = v,
            None => missing.push(name),
        }
    }
    if missing.is_empty() {
        Ok(values)
    } else {
        Err(ValidationError {
            missing,
            invalid: None,
        })
    }
}

pub(crate) fn redirect_home() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

/// Register every route. The catch-all trigger route goes last so fixed paths win.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(overview)
        .service(sessions_list)
        .service(search_movie)
        .service(search_music)
        .service(add_movie)
        .service(add_album)
        .service(delete_movie)
        .service(delete_album)
        .service(set_active_session)
        .service(clear_active_session)
        .service(trigger_play);
}
