//! In-memory [`Database`] for tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    pagination::{self, Page},
};
use tracerr::Traced;

use crate::{
    domain::{
        booking, listing, payment, user, Booking, Listing, Payment, Review,
        User,
    },
    infra::{database, Database},
    read,
};

/// [`Database`] keeping everything in memory.
///
/// Transactions are not isolated: [`Transact`] returns the same storage and
/// [`Commit`] does nothing.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored rows.
    state: Arc<Mutex<State>>,
}

/// Rows of a [`Memory`] database, in insertion order.
#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    listings: Vec<Listing>,
    bookings: Vec<Booking>,
    payments: Vec<Payment>,
    reviews: Vec<Review>,
}

impl Memory {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Returns all the stored [`User`]s, including the deleted ones.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.state().users.clone()
    }

    /// Returns all the stored [`Listing`]s.
    #[must_use]
    pub fn listings(&self) -> Vec<Listing> {
        self.state().listings.clone()
    }

    /// Returns all the stored [`Booking`]s.
    #[must_use]
    pub fn bookings(&self) -> Vec<Booking> {
        self.state().bookings.clone()
    }

    /// Returns all the stored [`Payment`]s.
    #[must_use]
    pub fn payments(&self) -> Vec<Payment> {
        self.state().payments.clone()
    }

    /// Returns all the stored [`Review`]s.
    #[must_use]
    pub fn reviews(&self) -> Vec<Review> {
        self.state().reviews.clone()
    }
}

/// Replaces the row with the same ID or appends a new one.
fn upsert<T, Id: PartialEq>(rows: &mut Vec<T>, row: T, id: impl Fn(&T) -> Id) {
    if let Some(existing) = rows.iter_mut().find(|r| id(r) == id(&row)) {
        *existing = row;
    } else {
        rows.push(row);
    }
}

/// Cuts a [`Page`] out of the provided rows.
fn page<T: Clone>(rows: &[T], args: pagination::Arguments) -> Page<T> {
    Page::new(
        args,
        rows.iter().skip(args.offset()).take(args.limit()).cloned(),
        rows.len(),
    )
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<W, B> Database<Lock<By<W, B>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Lock<By<W, B>>) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, Insert(u): Insert<User>) -> Result<(), Self::Err> {
        upsert(&mut self.state().users, u, |u| u.id);
        Ok(())
    }
}

impl Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, Update(u): Update<User>) -> Result<(), Self::Err> {
        upsert(&mut self.state().users, u, |u| u.id);
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned())
    }
}

impl<'u> Database<Select<By<Option<User>, &'u user::Username>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'u user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| &u.username == username && u.deleted_at.is_none())
            .cloned())
    }
}

impl<IDs> Database<Select<By<HashMap<user::Id, User>, IDs>>> for Memory
where
    IDs: AsRef<[user::Id]>,
{
    type Ok = HashMap<user::Id, User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<user::Id, User>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        Ok(self
            .state()
            .users
            .iter()
            .filter(|u| ids.as_ref().contains(&u.id) && u.deleted_at.is_none())
            .map(|u| (u.id, u.clone()))
            .collect())
    }
}

impl Database<Select<By<read::user::list::Page, read::user::list::Selector>>>
    for Memory
{
    type Ok = read::user::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::user::list::Page, read::user::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let alive = self
            .state()
            .users
            .iter()
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .collect::<Vec<_>>();
        Ok(page(&alive, by.into_inner().arguments))
    }
}

impl Database<Insert<Listing>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(l): Insert<Listing>,
    ) -> Result<(), Self::Err> {
        upsert(&mut self.state().listings, l, |l| l.id);
        Ok(())
    }
}

impl Database<Update<Listing>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(l): Update<Listing>,
    ) -> Result<(), Self::Err> {
        upsert(&mut self.state().listings, l, |l| l.id);
        Ok(())
    }
}

impl Database<Delete<By<Listing, listing::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Listing, listing::Id>>,
    ) -> Result<(), Self::Err> {
        let id = by.into_inner();
        let mut state = self.state();
        state.listings.retain(|l| l.id != id);
        let bookings = state
            .bookings
            .iter()
            .filter(|b| b.listing_id == id)
            .map(|b| b.id)
            .collect::<Vec<_>>();
        state.bookings.retain(|b| b.listing_id != id);
        state.payments.retain(|p| !bookings.contains(&p.booking_id));
        state.reviews.retain(|r| r.listing_id != id);
        Ok(())
    }
}

impl Database<Select<By<Option<Listing>, listing::Id>>> for Memory {
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().listings.iter().find(|l| l.id == id).cloned())
    }
}

impl<'s> Database<Select<By<Option<Listing>, &'s listing::Slug>>> for Memory {
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, &'s listing::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        let slug = by.into_inner();
        Ok(self
            .state()
            .listings
            .iter()
            .find(|l| &l.slug == slug)
            .cloned())
    }
}

impl<IDs> Database<Select<By<HashMap<listing::Id, Listing>, IDs>>> for Memory
where
    IDs: AsRef<[listing::Id]>,
{
    type Ok = HashMap<listing::Id, Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<listing::Id, Listing>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        Ok(self
            .state()
            .listings
            .iter()
            .filter(|l| ids.as_ref().contains(&l.id))
            .map(|l| (l.id, l.clone()))
            .collect())
    }
}

impl<IDs> Database<Select<By<HashMap<listing::Id, read::listing::Rating>, IDs>>>
    for Memory
where
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
        let state = self.state();
        Ok(ids
            .as_ref()
            .iter()
            .map(|id| {
                let ratings = state
                    .reviews
                    .iter()
                    .filter(|r| r.listing_id == *id)
                    .map(|r| f64::from(r.rating.get()))
                    .collect::<Vec<_>>();
                #[expect(clippy::cast_precision_loss, reason = "test only")]
                let average = (!ratings.is_empty()).then(|| {
                    ratings.iter().sum::<f64>() / ratings.len() as f64
                });
                let rating = read::listing::Rating {
                    reviews_count: u32::try_from(ratings.len()).unwrap(),
                    average,
                };
                (*id, rating)
            })
            .collect())
    }
}

impl
    Database<
        Select<By<read::listing::list::Page, read::listing::list::Selector>>,
    > for Memory
{
    type Ok = read::listing::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::listing::list::Page, read::listing::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(page(&self.state().listings, by.into_inner().arguments))
    }
}

impl Database<Insert<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(b): Insert<Booking>,
    ) -> Result<(), Self::Err> {
        upsert(&mut self.state().bookings, b, |b| b.id);
        Ok(())
    }
}

impl Database<Update<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(b): Update<Booking>,
    ) -> Result<(), Self::Err> {
        upsert(&mut self.state().bookings, b, |b| b.id);
        Ok(())
    }
}

impl Database<Delete<By<Booking, booking::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Booking, booking::Id>>,
    ) -> Result<(), Self::Err> {
        let id = by.into_inner();
        let mut state = self.state();
        state.bookings.retain(|b| b.id != id);
        state.payments.retain(|p| p.booking_id != id);
        Ok(())
    }
}

impl Database<Select<By<Option<Booking>, booking::Id>>> for Memory {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().bookings.iter().find(|b| b.id == id).cloned())
    }
}

impl
    Database<
        Select<By<read::booking::list::Page, read::booking::list::Selector>>,
    > for Memory
{
    type Ok = read::booking::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::list::Page, read::booking::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(page(&self.state().bookings, by.into_inner().arguments))
    }
}

impl Database<Insert<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(p): Insert<Payment>,
    ) -> Result<(), Self::Err> {
        upsert(&mut self.state().payments, p, |p| p.id);
        Ok(())
    }
}

impl Database<Update<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(p): Update<Payment>,
    ) -> Result<(), Self::Err> {
        upsert(&mut self.state().payments, p, |p| p.id);
        Ok(())
    }
}

impl Database<Select<By<Option<Payment>, payment::Id>>> for Memory {
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().payments.iter().find(|p| p.id == id).cloned())
    }
}

impl<'t> Database<Select<By<Option<Payment>, &'t payment::TransactionId>>>
    for Memory
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, &'t payment::TransactionId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let tx_id = by.into_inner();
        Ok(self
            .state()
            .payments
            .iter()
            .find(|p| &p.transaction_id == tx_id)
            .cloned())
    }
}

impl Database<Insert<Review>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(r): Insert<Review>,
    ) -> Result<(), Self::Err> {
        self.state().reviews.push(r);
        Ok(())
    }
}

impl Database<Select<By<Option<Review>, (listing::Id, user::Id)>>> for Memory {
    type Ok = Option<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Review>, (listing::Id, user::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (listing_id, user_id) = by.into_inner();
        Ok(self
            .state()
            .reviews
            .iter()
            .find(|r| r.listing_id == listing_id && r.user_id == user_id)
            .cloned())
    }
}

impl
    Database<
        Select<By<read::review::list::Page, read::review::list::Selector>>,
    > for Memory
{
    type Ok = read::review::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::review::list::Page, read::review::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::review::list::Selector { arguments, filter } =
            by.into_inner();
        let reviews = self
            .state()
            .reviews
            .iter()
            .filter(|r| r.listing_id == filter.listing_id)
            .cloned()
            .collect::<Vec<_>>();
        Ok(page(&reviews, arguments))
    }
}
