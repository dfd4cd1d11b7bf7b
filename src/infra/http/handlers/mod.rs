mod account;
mod catalog;

pub use account::{activate_book, upload_media};
pub use catalog::{
    get_book, get_exam, get_menu_entry, get_question, list_books, list_menu_book, search,
};

use axum::{
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::application::content::Reply;

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        response
    }
}

pub async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}
