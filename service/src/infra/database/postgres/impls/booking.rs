//! [`Booking`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{booking, Booking},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::{limit_offset, total};

/// Columns of the `bookings` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, listing_id, user_id, \
    check_in, check_out, guests, \
    price, status, created_at";

/// Builds a [`Booking`] out of a `bookings` table [`Row`].
fn from_row(row: &Row) -> Booking {
    Booking {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        user_id: row.get("user_id"),
        stay: booking::Stay::new(row.get("check_in"), row.get("check_out"))
            .expect("`check_in < check_out` is checked by the database"),
        guests: u16::try_from(row.get::<_, i32>("guests"))
            .ok()
            .and_then(booking::Guests::new)
            .expect("`guests` is checked by the database"),
        price: row.get("price"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<booking::Id, Booking>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[booking::Id]>,
{
    type Ok = HashMap<booking::Id, Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<booking::Id, Booking>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[booking::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE id = ANY($1::UUID[])",
        );
        Ok(self
            .query(&sql, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let booking = from_row(row);
                (booking.id, booking)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<booking::Id, Booking>, [booking::Id; 1]>>,
        Ok = HashMap<booking::Id, Booking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(booking))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            listing_id,
            user_id,
            stay,
            guests,
            price,
            status,
            created_at,
        } = booking;

        let guests = i32::from(guests.get());

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, listing_id, user_id, \
                check_in, check_out, guests, \
                price, status, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::DATE, $5::DATE, $6::INT4, \
                $7::NUMERIC, $8::INT2, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET listing_id = EXCLUDED.listing_id, \
                check_in = EXCLUDED.check_in, \
                check_out = EXCLUDED.check_out, \
                guests = EXCLUDED.guests, \
                price = EXCLUDED.price, \
                status = EXCLUDED.status";
        self.exec(
            SQL,
            &[
                &id,
                &listing_id,
                &user_id,
                &stay.check_in(),
                &stay.check_out(),
                &guests,
                &price,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM bookings \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM bookings \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::booking::list::Page, read::booking::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::list::Page, read::booking::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::list::Selector {
            arguments,
            filter: (),
        } = by.into_inner();
        let (limit, offset) = limit_offset(arguments);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             ORDER BY created_at, id \
             LIMIT $1::INT8 OFFSET $2::INT8",
        );
        let rows = self
            .query(&sql, &[&limit, &offset])
            .await
            .map_err(tracerr::wrap!())?;

        const COUNT_SQL: &str = "SELECT COUNT(*) FROM bookings";
        let count = self
            .query_one(COUNT_SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .get::<_, i64>(0);

        Ok(read::booking::list::Page::new(
            arguments,
            rows.iter().map(from_row),
            total(count),
        ))
    }
}
