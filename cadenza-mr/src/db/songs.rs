//! Song catalogue persistence

use cadenza_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::SongMetadata;

/// Persistent song record
#[derive(Debug, Clone)]
pub struct SongRecord {
    pub guid: Uuid,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub duration: Option<f64>,
    pub release_date: Option<String>,
    pub popularity_score: f64,
    pub spotify_id: Option<String>,
    pub youtube_id: Option<String>,
}

/// Insert a new song row under a caller-assigned id
pub async fn insert_song(pool: &SqlitePool, guid: Uuid, metadata: &SongMetadata) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO songs (
            guid, title, artist, album, genre, language, duration,
            release_date, popularity_score, spotify_id, youtube_id,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(&metadata.title)
    .bind(&metadata.artist)
    .bind(&metadata.album)
    .bind(&metadata.genre)
    .bind(&metadata.language)
    .bind(metadata.duration)
    .bind(&metadata.release_date)
    .bind(metadata.popularity_score)
    .bind(&metadata.spotify_id)
    .bind(&metadata.youtube_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load song by id
pub async fn get_song(pool: &SqlitePool, guid: Uuid) -> Result<Option<SongRecord>> {
    let row = sqlx::query(
        r#"
        SELECT guid, title, artist, album, genre, language, duration,
               release_date, popularity_score, spotify_id, youtube_id
        FROM songs
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(SongRecord {
                guid: Uuid::parse_str(&guid_str)
                    .map_err(|e| cadenza_common::Error::Internal(format!("Corrupt song id: {}", e)))?,
                title: row.get("title"),
                artist: row.get("artist"),
                album: row.get("album"),
                genre: row.get("genre"),
                language: row.get("language"),
                duration: row.get("duration"),
                release_date: row.get("release_date"),
                popularity_score: row.get("popularity_score"),
                spotify_id: row.get("spotify_id"),
                youtube_id: row.get("youtube_id"),
            }))
        }
        None => Ok(None),
    }
}

/// Delete song by id; returns whether a row existed
pub async fn delete_song(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM songs WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::initialize_schema;

    fn sample_metadata() -> SongMetadata {
        SongMetadata {
            title: "Clair de Lune".to_string(),
            artist: "Claude Debussy".to_string(),
            album: Some("Suite bergamasque".to_string()),
            genre: Some("classical".to_string()),
            language: Some("fr".to_string()),
            duration: Some(300.0),
            release_date: Some("1905-01-01".to_string()),
            popularity_score: 0.9,
            spotify_id: None,
            youtube_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_song() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let guid = Uuid::new_v4();
        insert_song(&pool, guid, &sample_metadata()).await.unwrap();

        let loaded = get_song(&pool, guid).await.unwrap().expect("song not found");
        assert_eq!(loaded.guid, guid);
        assert_eq!(loaded.title, "Clair de Lune");
        assert_eq!(loaded.artist, "Claude Debussy");
        assert_eq!(loaded.popularity_score, 0.9);
    }

    #[tokio::test]
    async fn test_get_missing_song_is_none() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        assert!(get_song(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_song() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();

        let guid = Uuid::new_v4();
        insert_song(&pool, guid, &sample_metadata()).await.unwrap();

        assert!(delete_song(&pool, guid).await.unwrap());
        assert!(get_song(&pool, guid).await.unwrap().is_none());
        assert!(!delete_song(&pool, guid).await.unwrap());
    }
}
