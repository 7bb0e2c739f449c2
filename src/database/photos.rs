use crate::error::ServiceResult;
use crate::models::Image;

use super::DatabaseConnection;

impl DatabaseConnection {
    pub async fn store_photo(&mut self, image: Image) -> ServiceResult<i32> {
        let id: i32 =
            sqlx::query_scalar("INSERT INTO photos (mimetype, data) VALUES ($1, $2) RETURNING id")
                .bind(&image.mimetype)
                .bind(&image.data)
                .fetch_one(&mut *self.connection)
                .await?;
        Ok(id)
    }

    pub async fn get_photo(&mut self, id: i32) -> ServiceResult<Option<Image>> {
        let row: Option<(String, Vec<u8>)> =
            sqlx::query_as("SELECT mimetype, data FROM photos WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.connection)
                .await?;

        Ok(row.map(|(mimetype, data)| Image { data, mimetype }))
    }
}
