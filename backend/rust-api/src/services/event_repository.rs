use axum::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, PgConnection, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::DatabasePool;
use crate::models::{
    Category, Event, EventAttendee, EventAttendees, EventId, Rsvp, RsvpStatus, UserId,
};
use crate::services::sources::{EventFilter, EventStore};

const EVENT_COLUMNS: &str = "id, title, description, start_date, end_date, location, address, \
    city, category, event_type, image_url, price, is_free, organizer_name, organizer_contact, \
    ticket_url, max_capacity, going_count, interested_count, source, external_id, created_by, \
    created_at, updated_at, is_deleted";

const RSVP_COLUMNS: &str = "id, event_id, user_id, status, created_at, updated_at";

fn decode_category(value: &str) -> Result<Category, sqlx::Error> {
    Category::from_str(value)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown category '{}'", value).into()))
}

fn decode_status(value: &str) -> Result<RsvpStatus, sqlx::Error> {
    RsvpStatus::from_str(value)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown RSVP status '{}'", value).into()))
}

impl<'r> FromRow<'r, PgRow> for Event {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            location: row.try_get("location")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            category: decode_category(row.try_get("category")?)?,
            event_type: row.try_get("event_type")?,
            image_url: row.try_get("image_url")?,
            price: row.try_get("price")?,
            is_free: row.try_get("is_free")?,
            organizer_name: row.try_get("organizer_name")?,
            organizer_contact: row.try_get("organizer_contact")?,
            ticket_url: row.try_get("ticket_url")?,
            max_capacity: row.try_get("max_capacity")?,
            going_count: row.try_get("going_count")?,
            interested_count: row.try_get("interested_count")?,
            source: row.try_get("source")?,
            external_id: row.try_get("external_id")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            is_deleted: row.try_get("is_deleted")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Rsvp {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            event_id: row.try_get("event_id")?,
            user_id: row.try_get("user_id")?,
            status: decode_status(row.try_get("status")?)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for EventAttendee {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            avatar_url: row.try_get("avatar_url")?,
            status: decode_status(row.try_get("status")?)?,
            rsvped_at: row.try_get("rsvped_at")?,
        })
    }
}

/// Postgres-backed [`EventStore`].
#[derive(Clone)]
pub struct PgEventStore {
    pool: DatabasePool,
}

impl PgEventStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Recompute an event's counters from its RSVP rows.
async fn refresh_counts(conn: &mut PgConnection, event_id: EventId) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE events SET
            going_count = (SELECT COUNT(*) FROM event_rsvps WHERE event_id = $1 AND status = 'going'),
            interested_count = (SELECT COUNT(*) FROM event_rsvps WHERE event_id = $1 AND status = 'interested'),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(event_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Live events matching `filter`, starting at or after `from` when given.
fn events_query(filter: &EventFilter, from: Option<DateTime<Utc>>) -> QueryBuilder<'_, Postgres> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM events WHERE is_deleted = false",
        EVENT_COLUMNS
    ));

    if let Some(from) = from {
        query_builder.push(" AND start_date >= ");
        query_builder.push_bind(from);
    }

    if let Some(city) = &filter.city {
        if !city.is_empty() {
            query_builder.push(" AND LOWER(city) = LOWER(");
            query_builder.push_bind(city);
            query_builder.push(")");
        }
    }

    if let Some(category) = filter.category {
        query_builder.push(" AND category = ");
        query_builder.push_bind(category.as_str());
    }

    query_builder.push(" ORDER BY start_date ASC, id ASC LIMIT ");
    query_builder.push_bind(filter.limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(filter.offset);
    query_builder
}

/// RSVPs where `owner_column` (`user_id` or `event_id`) equals `id`, newest first.
fn rsvps_query(
    owner_column: &'static str,
    id: Uuid,
    status: Option<RsvpStatus>,
) -> QueryBuilder<'static, Postgres> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM event_rsvps WHERE {} = ",
        RSVP_COLUMNS, owner_column
    ));
    query_builder.push_bind(id);

    if let Some(status) = status {
        query_builder.push(" AND status = ");
        query_builder.push_bind(status.as_str());
    }

    query_builder.push(" ORDER BY created_at DESC");
    query_builder
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn upsert_event(&self, event: &Event) -> Result<Event, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO events (
                id, title, description, start_date, end_date, location, address, city,
                category, event_type, image_url, price, is_free, organizer_name,
                organizer_contact, ticket_url, max_capacity, source, external_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                location = EXCLUDED.location,
                address = EXCLUDED.address,
                city = EXCLUDED.city,
                category = EXCLUDED.category,
                event_type = EXCLUDED.event_type,
                image_url = EXCLUDED.image_url,
                price = EXCLUDED.price,
                is_free = EXCLUDED.is_free,
                organizer_name = EXCLUDED.organizer_name,
                organizer_contact = EXCLUDED.organizer_contact,
                ticket_url = EXCLUDED.ticket_url,
                max_capacity = EXCLUDED.max_capacity,
                updated_at = NOW()
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        sqlx::query_as::<_, Event>(&sql)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.location)
            .bind(&event.address)
            .bind(&event.city)
            .bind(event.category.as_str())
            .bind(&event.event_type)
            .bind(&event.image_url)
            .bind(&event.price)
            .bind(event.is_free)
            .bind(&event.organizer_name)
            .bind(&event.organizer_contact)
            .bind(&event.ticket_url)
            .bind(event.max_capacity)
            .bind(&event.source)
            .bind(&event.external_id)
            .bind(event.created_by)
            .fetch_one(&*self.pool)
            .await
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM events WHERE id = $1 AND is_deleted = false",
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
    }

    async fn get_events_by_ids(&self, ids: &[EventId]) -> Result<Vec<Event>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM events WHERE id = ANY($1) AND is_deleted = false",
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(ids)
            .fetch_all(&*self.pool)
            .await
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, sqlx::Error> {
        events_query(filter, None)
            .build_query_as::<Event>()
            .fetch_all(&*self.pool)
            .await
    }

    async fn list_upcoming(
        &self,
        filter: &EventFilter,
        from: DateTime<Utc>,
    ) -> Result<Vec<Event>, sqlx::Error> {
        events_query(filter, Some(from))
            .build_query_as::<Event>()
            .fetch_all(&*self.pool)
            .await
    }

    async fn list_user_events(&self, user_id: UserId) -> Result<Vec<Event>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM events WHERE created_by = $1 AND is_deleted = false ORDER BY created_at DESC",
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(user_id)
            .fetch_all(&*self.pool)
            .await
    }

    async fn update_event(&self, event: &Event) -> Result<Option<Event>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE events SET
                title = $2, description = $3, start_date = $4, end_date = $5, location = $6,
                address = $7, city = $8, category = $9, event_type = $10, image_url = $11,
                price = $12, is_free = $13, organizer_name = $14, organizer_contact = $15,
                ticket_url = $16, max_capacity = $17, updated_at = NOW()
            WHERE id = $1 AND is_deleted = false
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        sqlx::query_as::<_, Event>(&sql)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.location)
            .bind(&event.address)
            .bind(&event.city)
            .bind(event.category.as_str())
            .bind(&event.event_type)
            .bind(&event.image_url)
            .bind(&event.price)
            .bind(event.is_free)
            .bind(&event.organizer_name)
            .bind(&event.organizer_contact)
            .bind(&event.ticket_url)
            .bind(event.max_capacity)
            .fetch_optional(&*self.pool)
            .await
    }

    async fn soft_delete_event(&self, id: EventId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE events SET is_deleted = true, updated_at = NOW() WHERE id = $1 AND is_deleted = false",
        )
        .bind(id)
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_rsvp(
        &self,
        event_id: EventId,
        user_id: UserId,
        status: RsvpStatus,
    ) -> Result<Rsvp, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO event_rsvps (id, event_id, user_id, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, user_id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = NOW()
            RETURNING {}
            "#,
            RSVP_COLUMNS
        );
        let rsvp = sqlx::query_as::<_, Rsvp>(&sql)
            .bind(Uuid::new_v4())
            .bind(event_id)
            .bind(user_id)
            .bind(status.as_str())
            .fetch_one(&mut *tx)
            .await?;

        refresh_counts(&mut tx, event_id).await?;
        tx.commit().await?;

        Ok(rsvp)
    }

    async fn delete_rsvp(&self, event_id: EventId, user_id: UserId) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM event_rsvps WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        refresh_counts(&mut tx, event_id).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn get_rsvp(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Option<Rsvp>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM event_rsvps WHERE event_id = $1 AND user_id = $2",
            RSVP_COLUMNS
        );
        sqlx::query_as::<_, Rsvp>(&sql)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&*self.pool)
            .await
    }

    async fn list_user_rsvps(
        &self,
        user_id: UserId,
        status: Option<RsvpStatus>,
    ) -> Result<Vec<Rsvp>, sqlx::Error> {
        rsvps_query("user_id", user_id, status)
            .build_query_as::<Rsvp>()
            .fetch_all(&*self.pool)
            .await
    }

    async fn list_event_rsvps(
        &self,
        event_id: EventId,
        status: Option<RsvpStatus>,
    ) -> Result<Vec<Rsvp>, sqlx::Error> {
        rsvps_query("event_id", event_id, status)
            .build_query_as::<Rsvp>()
            .fetch_all(&*self.pool)
            .await
    }

    async fn get_attendees(&self, event_id: EventId) -> Result<EventAttendees, sqlx::Error> {
        let attendees = sqlx::query_as::<_, EventAttendee>(
            r#"
            SELECT er.user_id, u.username, u.first_name, u.last_name, u.avatar_url,
                   er.status, er.created_at AS rsvped_at
            FROM event_rsvps er
            JOIN users u ON u.id = er.user_id
            WHERE er.event_id = $1
            ORDER BY er.created_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(EventAttendees::from_ordered(attendees))
    }
}
