use super::QueueService;
use crate::{
    error::Result,
    models::{active_statuses_sql, MyQueueEntry, QueueEntryView},
    salons,
};

impl QueueService<'_> {
    /// Every entry a salon ever admitted, ordered by position.
    pub async fn salon_queue(&self, salon_id: &str) -> Result<Vec<QueueEntryView>> {
        let rows = sqlx::query_as::<_, QueueEntryView>(
            r#"SELECT q.id, q.salon_id, q.user_id, q.appointment_id, q.service, q.status,
                      q.position, q.joined_at, q.checkin_time, q.estimated_start,
                      q.estimated_wait_time, q.cancel_reason, q.updated_at,
                      u.display_name AS user_name, u.phone AS user_phone,
                      a.start_time AS appointment_start, a.status AS appointment_status
               FROM queue_entries q
               LEFT JOIN users u ON u.id = q.user_id
               LEFT JOIN appointments a ON a.id = q.appointment_id
               WHERE q.salon_id = ?
               ORDER BY q.position ASC, q.joined_at ASC"#,
        )
        .bind(salon_id)
        .fetch_all(self.db)
        .await?;
        Ok(rows)
    }

    /// The caller's active entry with salon name and how far the line has moved.
    ///
    /// People ahead is the raw position gap to whoever is being served, not a
    /// live count of the entries in between.
    pub async fn current_for_user(&self, user_id: &str) -> Result<Option<MyQueueEntry>> {
        let Some(entry) = self.active_entry_for(user_id).await? else {
            return Ok(None);
        };

        let salon_name = salons::find(self.db, &entry.salon_id).await?.map(|salon| salon.name);
        let now_serving_position = sqlx::query_scalar::<_, i64>(concat!(
            "SELECT position FROM queue_entries
             WHERE salon_id = ? AND status IN (",
            active_statuses_sql!(),
            ")
             ORDER BY CASE WHEN status = 'checked-in' THEN 0 ELSE 1 END, position ASC
             LIMIT 1"
        ))
        .bind(&entry.salon_id)
        .fetch_optional(self.db)
        .await?;

        let people_ahead = now_serving_position
            .map(|serving| (entry.position - serving).max(0))
            .unwrap_or(0);

        Ok(Some(MyQueueEntry {
            entry,
            salon_name,
            now_serving_position,
            people_ahead,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::{models::QueueStatus, testing::Fixture};

    #[actix_web::test]
    async fn salon_queue_is_ordered_with_user_fields() {
        let fx = Fixture::new().await;
        let u1 = fx.customer("u1").await;
        let u2 = fx.customer("u2").await;
        fx.service().join(&u2, &fx.salon_id, None).await.unwrap();
        fx.service().join(&u1, &fx.salon_id, None).await.unwrap();

        let queue = fx.service().salon_queue(&fx.salon_id).await.unwrap();

        let positions: Vec<i64> = queue.iter().map(|view| view.entry.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(queue[0].user_name.as_deref(), Some("u2"));
        assert_eq!(queue[1].entry.user_id, u1.user_id);
    }

    #[actix_web::test]
    async fn current_entry_reports_people_ahead() {
        let fx = Fixture::new().await;
        let u1 = fx.customer("u1").await;
        let u2 = fx.customer("u2").await;
        let u3 = fx.customer("u3").await;
        let first = fx.service().join(&u1, &fx.salon_id, None).await.unwrap();
        fx.service().join(&u2, &fx.salon_id, None).await.unwrap();
        fx.service().join(&u3, &fx.salon_id, None).await.unwrap();

        let mine = fx.service().current_for_user(&u3.user_id).await.unwrap().unwrap();
        assert_eq!(mine.now_serving_position, Some(1));
        assert_eq!(mine.people_ahead, 2);
        assert_eq!(mine.salon_name.as_deref(), Some("Fixture Salon"));

        fx.service().set_status(&first.id, &fx.vendor, "checked-in").await.unwrap();
        fx.service().set_status(&first.id, &fx.vendor, "completed").await.unwrap();

        let mine = fx.service().current_for_user(&u3.user_id).await.unwrap().unwrap();
        assert_eq!(mine.now_serving_position, Some(2));
        assert_eq!(mine.people_ahead, 1);
        assert_eq!(mine.entry.status, QueueStatus::Pending);
    }

    #[actix_web::test]
    async fn no_current_entry_after_cancel() {
        let fx = Fixture::new().await;
        let u1 = fx.customer("u1").await;
        fx.service().join(&u1, &fx.salon_id, None).await.unwrap();
        fx.service().cancel(None, &u1, None).await.unwrap();

        assert!(fx.service().current_for_user(&u1.user_id).await.unwrap().is_none());
    }
}
