use aide::axum::routing::{get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use aide::OperationOutput;
use axum::extract::{Multipart, Path};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use schemars::JsonSchema;
use serde::Serialize;

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models;
use crate::request_state::RequestState;

const SUPPORTED_IMAGE_TYPES: [&str; 6] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/upload", post_with(upload_photo, upload_photo_docs))
        .api_route("/photo/:id", get_with(get_photo, get_photo_docs))
        .with_state(app_state)
}

pub fn photo_url(id: i32) -> String {
    format!("/api/v1/photo/{}", id)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct UploadResultDto {
    pub success: bool,
    pub url: String,
}

/// The first non empty part with a supported image type.
async fn first_image(multipart: &mut Multipart) -> ServiceResult<Option<models::Image>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("Could not read upload: {e}")))?
    {
        let content_type = field.content_type().unwrap_or("").to_lowercase();
        if SUPPORTED_IMAGE_TYPES.iter().any(|t| *t == content_type) {
            let data = field
                .bytes()
                .await
                .map_err(|e| ServiceError::BadRequest(format!("Could not read file: {e}")))?;

            if data.is_empty() {
                continue;
            }

            return Ok(Some(models::Image {
                data: data.to_vec(),
                mimetype: content_type,
            }));
        }
    }

    Ok(None)
}

async fn upload_photo(
    mut state: RequestState,
    mut multipart: Multipart,
) -> ServiceResult<Json<UploadResultDto>> {
    state.session_require_admin()?;

    let image = first_image(&mut multipart)
        .await?
        .ok_or_else(|| ServiceError::BadRequest("No file provided".to_owned()))?;
    let id = state.db.store_photo(image).await?;

    Ok(Json(UploadResultDto {
        success: true,
        url: photo_url(id),
    }))
}

fn upload_photo_docs(op: TransformOperation) -> TransformOperation {
    op.description("Upload a photo of a delivery note. The first image part is stored.")
        .tag("photos")
        .response::<200, Json<UploadResultDto>>()
        .response_with::<400, (), _>(|res| res.description("No file provided!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["admin"])
}

pub struct PhotoResponse(models::Image);

impl OperationOutput for PhotoResponse {
    type Inner = Vec<u8>;
}
impl IntoResponse for PhotoResponse {
    fn into_response(self) -> axum::response::Response {
        let mut header = HeaderMap::new();
        if let Ok(content_type) = HeaderValue::from_str(&self.0.mimetype) {
            header.insert(header::CONTENT_TYPE, content_type);
        }
        (StatusCode::OK, header, self.0.data).into_response()
    }
}

async fn get_photo(mut state: RequestState, Path(id): Path<i32>) -> ServiceResult<PhotoResponse> {
    let image = state.db.get_photo(id).await?;

    if let Some(image) = image {
        return Ok(PhotoResponse(image));
    }

    Err(ServiceError::NotFound)
}

fn get_photo_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get the bytes of an uploaded photo.")
        .tag("photos")
        .response_with::<200, (), _>(|res| res.description("The stored image."))
        .response_with::<404, (), _>(|res| res.description("The requested photo does not exist!"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn multipart(body: &'static str) -> Multipart {
        use axum::body::Body;
        use axum::extract::{FromRequest, Request};

        let request = Request::builder()
            .method("POST")
            .header("content-type", "multipart/form-data; boundary=XYZ")
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_image_part_is_used() {
        let mut multipart = multipart(
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"note\"\r\n\r\n\
             hello\r\n\
             --XYZ\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n\
             --XYZ--\r\n",
        )
        .await;

        let image = first_image(&mut multipart).await.unwrap().unwrap();
        assert_eq!(image.mimetype, "image/png");
        assert_eq!(image.data, b"PNGDATA".to_vec());
    }

    #[tokio::test]
    async fn test_upload_without_image_part() {
        let mut multipart = multipart(
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"note\"\r\n\r\n\
             hello\r\n\
             --XYZ--\r\n",
        )
        .await;

        assert_eq!(first_image(&mut multipart).await, Ok(None));
    }

    #[tokio::test]
    async fn test_broken_upload_reports_the_cause() {
        let mut multipart = multipart("--XYZ\r\nContent-Disposition: form-data; name=\"file\"").await;

        match first_image(&mut multipart).await {
            Err(ServiceError::BadRequest(message)) => {
                assert!(message.starts_with("Could not read"));
                assert_ne!(message, "No file provided");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_photo_url() {
        assert_eq!(photo_url(12), "/api/v1/photo/12");
    }

    #[test]
    fn test_photo_response_sets_content_type() {
        let response = PhotoResponse(models::Image {
            data: vec![1, 2, 3],
            mimetype: "image/png".to_owned(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    }
}
