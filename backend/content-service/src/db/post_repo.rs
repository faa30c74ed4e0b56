//! Post storage: typed CRUD, filtered queries, cursor seeks, and the
//! atomic scalar helpers the counter fields require.
//!
//! `PostFilter` is the only interface list-style queries accept from the
//! service layer — this module owns every SQL fragment and indexing
//! decision.

use crate::cursor::Cursor;
use crate::error::{AppError, Result};
use crate::models::{Post, PostFilter, SortDirection, SortField};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

pub async fn create(tx: &mut Transaction<'_, Postgres>, post: &Post) -> Result<()> {
    sqlx::query(
        "INSERT INTO posts (
            id, owner_user_id, owner_display_name, owner_avatar, post_type_id, body, tags,
            score, view_count, comment_counter, image, video, thumbnail, url_key,
            album_title, album_cover, album_photos, permission, disable_comments,
            disable_sharing, deleted, deleted_date, created_date, last_updated
        ) VALUES (
            $1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23,$24
        )",
    )
    .bind(post.id)
    .bind(post.owner_user_id)
    .bind(&post.owner_display_name)
    .bind(&post.owner_avatar)
    .bind(post.post_type_id)
    .bind(&post.body)
    .bind(&post.tags)
    .bind(post.score)
    .bind(post.view_count)
    .bind(post.comment_counter)
    .bind(&post.image)
    .bind(&post.video)
    .bind(&post.thumbnail)
    .bind(&post.url_key)
    .bind(&post.album_title)
    .bind(&post.album_cover)
    .bind(&post.album_photos)
    .bind(&post.permission)
    .bind(post.disable_comments)
    .bind(post.disable_sharing)
    .bind(post.deleted)
    .bind(post.deleted_date)
    .bind(post.created_date)
    .bind(post.last_updated)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Returns deleted posts too: idempotent-delete checks need to see them.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Post> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id} not found")))
}

pub async fn find_by_url_key(pool: &PgPool, key: &str) -> Result<Post> {
    sqlx::query_as::<_, Post>(
        "SELECT * FROM posts WHERE url_key = $1 AND deleted = false",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("post with url key {key} not found")))
}

pub async fn find_by_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(
        "SELECT * FROM posts WHERE owner_user_id = $1 AND deleted = false
         ORDER BY created_date DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(posts)
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    let mut has_clause = false;
    let mut push_and = |qb: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool| {
        if *has_clause {
            qb.push(" AND ");
        } else {
            qb.push(" WHERE ");
            *has_clause = true;
        }
    };

    if let Some(owner) = filter.owner_user_id {
        push_and(qb, &mut has_clause);
        qb.push("owner_user_id = ").push_bind(owner);
    }
    if let Some(post_type_id) = filter.post_type_id {
        push_and(qb, &mut has_clause);
        qb.push("post_type_id = ").push_bind(post_type_id);
    }
    if let Some(tags) = &filter.tags {
        push_and(qb, &mut has_clause);
        qb.push("tags && ").push_bind(tags.clone());
    }
    match filter.deleted {
        Some(deleted) => {
            push_and(qb, &mut has_clause);
            qb.push("deleted = ").push_bind(deleted);
        }
        None => {
            push_and(qb, &mut has_clause);
            qb.push("deleted = false");
        }
    }
    if let Some(after) = filter.created_after {
        push_and(qb, &mut has_clause);
        qb.push("created_date > ").push_bind(after);
    }
    if let Some(search) = &filter.search_text {
        push_and(qb, &mut has_clause);
        let pattern = format!("%{}%", search.to_lowercase());
        qb.push("(LOWER(body) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(owner_display_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE LOWER(t) LIKE ")
            .push_bind(pattern)
            .push("))");
    }
}

pub async fn find(pool: &PgPool, filter: &PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM posts");
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_date DESC, id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let posts = qb.build_query_as::<Post>().fetch_all(pool).await?;
    Ok(posts)
}

pub async fn count(pool: &PgPool, filter: &PostFilter) -> Result<i64> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM posts");
    push_filter(&mut qb, filter);
    let total: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(total)
}

/// Limit+1 keyset scan: `limit+1` rows are fetched and the caller drops
/// the overflow row, using its presence to set `hasMore`.
pub async fn find_with_cursor(
    pool: &PgPool,
    filter: &PostFilter,
    cursor: Option<&Cursor>,
    sort_field: SortField,
    sort_direction: SortDirection,
    limit: i64,
) -> Result<(Vec<Post>, bool)> {
    let column = sort_field.column();
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM posts");
    push_filter(&mut qb, filter);

    if let Some(cursor) = cursor {
        let op = match sort_direction {
            SortDirection::Desc => "<",
            SortDirection::Asc => ">",
        };
        qb.push(" AND (");
        match sort_field {
            SortField::CreatedDate => {
                let value: chrono::DateTime<chrono::Utc> =
                    serde_json::from_value(cursor.value.clone())
                        .map_err(|_| AppError::BadRequest("invalid cursor value".to_string()))?;
                qb.push(column).push(" ").push(op).push(" ").push_bind(value);
                qb.push(" OR (").push(column).push(" = ").push_bind(value);
            }
            SortField::Score | SortField::ViewCount | SortField::CommentCounter => {
                let value: i64 = serde_json::from_value(cursor.value.clone())
                    .map_err(|_| AppError::BadRequest("invalid cursor value".to_string()))?;
                qb.push(column).push(" ").push(op).push(" ").push_bind(value);
                qb.push(" OR (").push(column).push(" = ").push_bind(value);
            }
        }
        qb.push(" AND id ").push(op).push(" ").push_bind(cursor.id);
        qb.push("))");
    }

    qb.push(" ORDER BY ")
        .push(column)
        .push(match sort_direction {
            SortDirection::Desc => " DESC, id DESC",
            SortDirection::Asc => " ASC, id ASC",
        })
        .push(" LIMIT ")
        .push_bind(limit + 1);

    let mut posts = qb.build_query_as::<Post>().fetch_all(pool).await?;
    let has_more = posts.len() as i64 > limit;
    if has_more {
        posts.truncate(limit as usize);
    }
    Ok((posts, has_more))
}

/// Computes the 1-based position of `post_id` within the ordering implied
/// by `sort_field`/`sort_direction`, honoring the same compound
/// `(sort_value, id)` tie-break used by cursor pagination — the compound
/// form, not the simplified count some call sites are tempted to use.
pub async fn cursor_position(
    pool: &PgPool,
    post_id: Uuid,
    sort_field: SortField,
    sort_direction: SortDirection,
) -> Result<i64> {
    let column = sort_field.column();
    let op = match sort_direction {
        SortDirection::Desc => ">",
        SortDirection::Asc => "<",
    };
    let count_sql = format!(
        "SELECT COUNT(*) FROM posts WHERE deleted = false AND ({column} {op} $1 OR ({column} = $1 AND id {op} $2))"
    );

    let position: i64 = match sort_field {
        SortField::CreatedDate => {
            let target: chrono::DateTime<chrono::Utc> =
                sqlx::query_scalar(&format!("SELECT {column} FROM posts WHERE id = $1"))
                    .bind(post_id)
                    .fetch_optional(pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("post {post_id} not found")))?;
            sqlx::query_scalar(&count_sql)
                .bind(target)
                .bind(post_id)
                .fetch_one(pool)
                .await?
        }
        SortField::Score | SortField::ViewCount | SortField::CommentCounter => {
            let target: i64 =
                sqlx::query_scalar(&format!("SELECT {column} FROM posts WHERE id = $1"))
                    .bind(post_id)
                    .fetch_optional(pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("post {post_id} not found")))?;
            sqlx::query_scalar(&count_sql)
                .bind(target)
                .bind(post_id)
                .fetch_one(pool)
                .await?
        }
    };
    Ok(position + 1)
}

pub async fn update(tx: &mut Transaction<'_, Postgres>, post: &Post) -> Result<()> {
    sqlx::query(
        "UPDATE posts SET body = $1, tags = $2, image = $3, video = $4, thumbnail = $5,
         album_title = $6, album_cover = $7, album_photos = $8, permission = $9,
         disable_comments = $10, disable_sharing = $11, url_key = $12, last_updated = NOW()
         WHERE id = $13",
    )
    .bind(&post.body)
    .bind(&post.tags)
    .bind(&post.image)
    .bind(&post.video)
    .bind(&post.thumbnail)
    .bind(&post.album_title)
    .bind(&post.album_cover)
    .bind(&post.album_photos)
    .bind(&post.permission)
    .bind(post.disable_comments)
    .bind(post.disable_sharing)
    .bind(&post.url_key)
    .bind(post.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Soft-delete only (no cascade — the transactional cascade lives in the
/// service layer, which also touches `comments`).
pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE posts SET deleted = true, deleted_date = NOW(), last_updated = NOW()
         WHERE id = $1 AND deleted = false",
    )
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn update_owner_profile(
    pool: &PgPool,
    owner_id: Uuid,
    display_name: &str,
    avatar: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE posts SET owner_display_name = $1, owner_avatar = $2, last_updated = NOW()
         WHERE owner_user_id = $3",
    )
    .bind(display_name)
    .bind(avatar)
    .bind(owner_id)
    .execute(pool)
    .await?;
    Ok(())
}

// --- Atomic scalar helpers -------------------------------------------------
// Every increment below is a single `UPDATE ... SET col = col + $delta`
// statement; counters are never read-modify-written from application code.

pub async fn increment_score(pool: &PgPool, id: Uuid, delta: i64) -> Result<()> {
    sqlx::query("UPDATE posts SET score = score + $1, last_updated = NOW() WHERE id = $2")
        .bind(delta)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn increment_view_count(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE posts SET view_count = view_count + 1, last_updated = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Service-to-service form: no ownership check. `IncrementCommentCount`
/// (the user-facing variant) wraps this with an ownership-checked caller.
pub async fn increment_comment_count(pool: &PgPool, id: Uuid, delta: i64) -> Result<()> {
    sqlx::query(
        "UPDATE posts SET comment_counter = GREATEST(0, comment_counter + $1), last_updated = NOW()
         WHERE id = $2",
    )
    .bind(delta)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_comment_counter(pool: &PgPool, id: Uuid, value: i64) -> Result<()> {
    sqlx::query("UPDATE posts SET comment_counter = $1, last_updated = NOW() WHERE id = $2")
        .bind(value)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Ownership-embedded: the `WHERE` clause itself enforces the check, so
/// zero rows affected means "not found or not owner" without a prior read.
pub async fn set_comment_disabled(
    pool: &PgPool,
    id: Uuid,
    disabled: bool,
    owner_id: Uuid,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE posts SET disable_comments = $1, last_updated = NOW()
         WHERE id = $2 AND owner_user_id = $3",
    )
    .bind(disabled)
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("post {id} not found")));
    }
    Ok(())
}

pub async fn set_sharing_disabled(
    pool: &PgPool,
    id: Uuid,
    disabled: bool,
    owner_id: Uuid,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE posts SET disable_sharing = $1, last_updated = NOW()
         WHERE id = $2 AND owner_user_id = $3",
    )
    .bind(disabled)
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("post {id} not found")));
    }
    Ok(())
}

pub async fn set_url_key(pool: &PgPool, id: Uuid, url_key: &str) -> Result<()> {
    sqlx::query("UPDATE posts SET url_key = $1, last_updated = NOW() WHERE id = $2")
        .bind(url_key)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
