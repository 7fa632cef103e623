//! [`Listing`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{listing, Listing},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::{limit_offset, total, Tx};

/// Columns of the `listings` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, title, slug, description, host_id, location, kind, \
    price, capacity, available_from, available_to, created_at";

/// Builds a [`Listing`] out of a `listings` table [`Row`].
fn from_row(row: &Row) -> Listing {
    Listing {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        host_id: row.get("host_id"),
        location: row.get("location"),
        kind: row.get("kind"),
        price: row.get("price"),
        capacity: u16::try_from(row.get::<_, i32>("capacity"))
            .ok()
            .and_then(listing::Capacity::new)
            .expect("`capacity` is checked by the database"),
        availability: listing::Availability::new(
            row.get("available_from"),
            row.get("available_to"),
        )
        .expect("`available_from <= available_to` is checked by the database"),
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<listing::Id, Listing>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[listing::Id]>,
{
    type Ok = HashMap<listing::Id, Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<listing::Id, Listing>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[listing::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM listings \
             WHERE id = ANY($1::UUID[])",
        );
        Ok(self
            .query(&sql, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let listing = from_row(row);
                (listing.id, listing)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Listing>, listing::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<listing::Id, Listing>, [listing::Id; 1]>>,
        Ok = HashMap<listing::Id, Listing>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<'s, C> Database<Select<By<Option<Listing>, &'s listing::Slug>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, &'s listing::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        let slug = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM listings \
             WHERE slug = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[slug])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Listing>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Listing>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(listing): Insert<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(listing)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Listing>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(listing): Update<Listing>,
    ) -> Result<Self::Ok, Self::Err> {
        let Listing {
            id,
            title,
            slug,
            description,
            host_id,
            location,
            kind,
            price,
            capacity,
            availability,
            created_at,
        } = listing;

        let capacity = i32::from(capacity.get());

        const SQL: &str = "\
            INSERT INTO listings (\
                id, title, slug, description, host_id, location, kind, \
                price, capacity, available_from, available_to, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::TEXT, \
                $5::UUID, $6::VARCHAR, $7::INT2, \
                $8::NUMERIC, $9::INT4, $10::DATE, $11::DATE, \
                $12::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET title = EXCLUDED.title, \
                slug = EXCLUDED.slug, \
                description = EXCLUDED.description, \
                host_id = EXCLUDED.host_id, \
                location = EXCLUDED.location, \
                kind = EXCLUDED.kind, \
                price = EXCLUDED.price, \
                capacity = EXCLUDED.capacity, \
                available_from = EXCLUDED.available_from, \
                available_to = EXCLUDED.available_to";
        self.exec(
            SQL,
            &[
                &id,
                &title,
                &slug,
                &description,
                &host_id,
                &location,
                &kind,
                &price,
                &capacity,
                &availability.first_day(),
                &availability.last_day(),
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Listing, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM listings \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Listing, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM listings \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<'s> Database<Lock<By<Listing, &'s listing::Slug>>> for Postgres<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Listing, &'s listing::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock_key("listings.slug", by.into_inner())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C, IDs>
    Database<Select<By<HashMap<listing::Id, read::listing::Rating>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[listing::Id]>,
{
    type Ok = HashMap<listing::Id, read::listing::Rating>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<HashMap<listing::Id, read::listing::Rating>, IDs>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[listing::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const SQL: &str = "\
            SELECT listing_id, \
                   COUNT(*) AS reviews_count, \
                   AVG(rating)::FLOAT8 AS average \
            FROM reviews \
            WHERE listing_id = ANY($1::UUID[]) \
            GROUP BY listing_id";
        let mut ratings = self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                (
                    row.get("listing_id"),
                    read::listing::Rating {
                        reviews_count: u32::try_from(
                            row.get::<_, i64>("reviews_count"),
                        )
                        .unwrap_or(u32::MAX),
                        average: row.get("average"),
                    },
                )
            })
            .collect::<HashMap<_, _>>();
        for id in ids {
            _ = ratings.entry(*id).or_default();
        }
        Ok(ratings)
    }
}

impl<C>
    Database<
        Select<By<read::listing::list::Page, read::listing::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::listing::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::listing::list::Page, read::listing::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::listing::list::Selector {
            arguments,
            filter: (),
        } = by.into_inner();
        let (limit, offset) = limit_offset(arguments);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM listings \
             ORDER BY created_at, id \
             LIMIT $1::INT8 OFFSET $2::INT8",
        );
        let rows = self
            .query(&sql, &[&limit, &offset])
            .await
            .map_err(tracerr::wrap!())?;

        const COUNT_SQL: &str = "SELECT COUNT(*) FROM listings";
        let count = self
            .query_one(COUNT_SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .get::<_, i64>(0);

        Ok(read::listing::list::Page::new(
            arguments,
            rows.iter().map(from_row),
            total(count),
        ))
    }
}
