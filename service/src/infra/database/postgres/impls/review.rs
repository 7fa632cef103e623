//! [`Review`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{listing, review, user, Review},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::{limit_offset, total};

/// Columns of the `reviews` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, listing_id, user_id, \
    rating, comment, created_at";

/// Builds a [`Review`] out of a `reviews` table [`Row`].
fn from_row(row: &Row) -> Review {
    Review {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        user_id: row.get("user_id"),
        rating: u8::try_from(row.get::<_, i16>("rating"))
            .ok()
            .and_then(review::Rating::new)
            .expect("`rating` is checked by the database"),
        comment: row.get("comment"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Review>, (listing::Id, user::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Review>, (listing::Id, user::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (listing_id, user_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reviews \
             WHERE listing_id = $1::UUID \
               AND user_id = $2::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&listing_id, &user_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Review>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        let Review {
            id,
            listing_id,
            user_id,
            rating,
            comment,
            created_at,
        } = review;

        let rating = i16::from(rating.get());

        const SQL: &str = "\
            INSERT INTO reviews (\
                id, listing_id, user_id, \
                rating, comment, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::INT2, $5::TEXT, $6::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[&id, &listing_id, &user_id, &rating, &comment, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::review::list::Page, read::review::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::review::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::review::list::Page, read::review::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::review::list::Selector {
            arguments,
            filter: read::review::list::Filter { listing_id },
        } = by.into_inner();
        let (limit, offset) = limit_offset(arguments);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reviews \
             WHERE listing_id = $1::UUID \
             ORDER BY created_at, id \
             LIMIT $2::INT8 OFFSET $3::INT8",
        );
        let rows = self
            .query(&sql, &[&listing_id, &limit, &offset])
            .await
            .map_err(tracerr::wrap!())?;

        const COUNT_SQL: &str = "\
            SELECT COUNT(*) \
            FROM reviews \
            WHERE listing_id = $1::UUID";
        let count = self
            .query_one(COUNT_SQL, &[&listing_id])
            .await
            .map_err(tracerr::wrap!())?
            .get::<_, i64>(0);

        Ok(read::review::list::Page::new(
            arguments,
            rows.iter().map(from_row),
            total(count),
        ))
    }
}
