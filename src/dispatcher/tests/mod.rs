use super::test_helpers::*;
use super::*;
use crate::transport::{HttpResponse, RequestBody};

mod podcast;

/// Text body of a request, whatever the channel's encoding
fn sent_text(request: &HttpRequest) -> String {
    match &request.body {
        RequestBody::Text(text) => text.clone(),
        RequestBody::Json(value) => value.to_string(),
    }
}
