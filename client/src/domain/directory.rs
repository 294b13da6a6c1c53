//! Data access layer over the four hosted collections.
//!
//! Owns in-memory snapshots of announcements, events, member profiles, and
//! payments. Snapshots are fully reloaded on every identity change, never
//! incrementally synced. Mutations are confirmed by the backend before the
//! local snapshot is patched, so a failed write leaves local state exactly
//! as it was.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::OpResult;
use crate::domain::announcement::{Announcement, AnnouncementPatch, NewAnnouncement};
use crate::domain::error::Error;
use crate::domain::event::{Event, EventPatch, NewEvent};
use crate::domain::member::{Member, MemberPatch};
use crate::domain::payment::{NewPayment, Payment, PaymentPatch, PaymentRow, PaymentStatus};
use crate::domain::ports::{
    Order, Returning, SelectQuery, StoreError, Table, TableStore, WireRow,
};
use crate::domain::session::SessionUser;
use crate::domain::wire;

/// Relation selector joining each payment to its payer profile.
const PAYMENT_EMBED: &str = "profile:profiles(name,student_id)";

/// Membership filter applied by the member search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MembershipFilter {
    /// Every member.
    #[default]
    All,
    /// Members with a settled membership.
    Paid,
    /// Members with an outstanding membership.
    Unpaid,
}

/// Client-side collections and their mutation operations.
///
/// All state is owned exclusively by this value and mutated only through
/// its methods. The loading flag is set for the whole reload window and
/// cleared once all four collections have settled.
pub struct Directory<S> {
    store: Arc<S>,
    announcements: Vec<Announcement>,
    events: Vec<Event>,
    members: Vec<Member>,
    payments: Vec<Payment>,
    loading: bool,
}

impl<S> Directory<S> {
    /// Create an empty directory over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            announcements: Vec::new(),
            events: Vec::new(),
            members: Vec::new(),
            payments: Vec::new(),
            loading: false,
        }
    }

    /// Announcements, newest first.
    #[must_use]
    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    /// Events, ascending by date.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Member profiles, ascending by name.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Payments, newest first.
    #[must_use]
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Whether a reload is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    fn clear(&mut self) {
        self.announcements.clear();
        self.events.clear();
        self.members.clear();
        self.payments.clear();
    }

    fn sort_announcements(&mut self) {
        self.announcements
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    fn sort_events(&mut self) {
        self.events.sort_by(|a, b| a.date.cmp(&b.date));
    }

    fn sort_members(&mut self) {
        self.members
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    }

    fn sort_payments(&mut self) {
        self.payments
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

impl<S> Directory<S>
where
    S: TableStore,
{
    /// Reload every collection for the given identity.
    ///
    /// `None` clears all four collections immediately without touching the
    /// store. `Some` fires the four fetches concurrently; an individual
    /// failure is logged, leaves that collection empty, and does not block
    /// its siblings.
    pub async fn reload(&mut self, user: Option<&SessionUser>) {
        if user.is_none() {
            self.clear();
            self.loading = false;
            return;
        }

        self.loading = true;
        let (announcements, events, members, payments) = tokio::join!(
            self.fetch_announcements(),
            self.fetch_events(),
            self.fetch_members(),
            self.fetch_payments(),
        );
        self.announcements = collect_or_logged(announcements, Table::Announcements);
        self.events = collect_or_logged(events, Table::Events);
        self.members = collect_or_logged(members, Table::Profiles);
        self.payments = collect_or_logged(payments, Table::Payments);
        self.sort_announcements();
        self.sort_events();
        self.sort_members();
        self.sort_payments();
        self.loading = false;
    }

    async fn fetch_announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        let rows = self
            .store
            .select(
                Table::Announcements,
                SelectQuery::all().order_by("created_at", Order::Descending),
            )
            .await?;
        rows.into_iter().map(wire::decode).collect()
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, StoreError> {
        let rows = self
            .store
            .select(
                Table::Events,
                SelectQuery::all().order_by("date", Order::Ascending),
            )
            .await?;
        rows.into_iter().map(wire::decode).collect()
    }

    async fn fetch_members(&self) -> Result<Vec<Member>, StoreError> {
        let rows = self
            .store
            .select(
                Table::Profiles,
                SelectQuery::all().order_by("name", Order::Ascending),
            )
            .await?;
        rows.into_iter().map(wire::decode).collect()
    }

    async fn fetch_payments(&self) -> Result<Vec<Payment>, StoreError> {
        let rows = self
            .store
            .select(
                Table::Payments,
                SelectQuery::all()
                    .order_by("created_at", Order::Descending)
                    .embed(PAYMENT_EMBED),
            )
            .await?;
        rows.into_iter()
            .map(|row| wire::decode::<PaymentRow>(row).map(Payment::from))
            .collect()
    }

    /// Publish an announcement.
    pub async fn add_announcement(&mut self, draft: NewAnnouncement) -> OpResult<Announcement> {
        let row = encode_payload(&draft)?;
        let stored = self
            .store
            .insert(Table::Announcements, row, Returning::Row)
            .await
            .map_err(map_store_error)?;
        let announcement: Announcement = decode_payload(stored)?;
        self.announcements.push(announcement.clone());
        self.sort_announcements();
        Ok(announcement)
    }

    /// Edit an announcement.
    pub async fn update_announcement(
        &mut self,
        id: Uuid,
        patch: AnnouncementPatch,
    ) -> OpResult<Announcement> {
        let changes = encode_payload(&patch)?;
        let stored = self
            .store
            .update(Table::Announcements, id, changes, Returning::Row)
            .await
            .map_err(map_store_error)?;
        let announcement: Announcement = decode_payload(stored)?;
        replace_by_id(&mut self.announcements, |a| a.id == id, announcement.clone());
        self.sort_announcements();
        Ok(announcement)
    }

    /// Remove an announcement. Removing an absent id is a no-op success.
    pub async fn delete_announcement(&mut self, id: Uuid) -> OpResult<()> {
        self.store
            .delete(Table::Announcements, id)
            .await
            .map_err(map_store_error)?;
        self.announcements.retain(|a| a.id != id);
        Ok(())
    }

    /// Schedule an event.
    pub async fn add_event(&mut self, draft: NewEvent) -> OpResult<Event> {
        let row = encode_payload(&draft)?;
        let stored = self
            .store
            .insert(Table::Events, row, Returning::Row)
            .await
            .map_err(map_store_error)?;
        let event: Event = decode_payload(stored)?;
        self.events.push(event.clone());
        self.sort_events();
        Ok(event)
    }

    /// Edit an event.
    pub async fn update_event(&mut self, id: Uuid, patch: EventPatch) -> OpResult<Event> {
        let changes = encode_payload(&patch)?;
        let stored = self
            .store
            .update(Table::Events, id, changes, Returning::Row)
            .await
            .map_err(map_store_error)?;
        let event: Event = decode_payload(stored)?;
        replace_by_id(&mut self.events, |e| e.id == id, event.clone());
        self.sort_events();
        Ok(event)
    }

    /// Remove an event. Removing an absent id is a no-op success.
    pub async fn delete_event(&mut self, id: Uuid) -> OpResult<()> {
        self.store
            .delete(Table::Events, id)
            .await
            .map_err(map_store_error)?;
        self.events.retain(|e| e.id != id);
        Ok(())
    }

    /// Edit a member profile.
    pub async fn update_member(&mut self, id: Uuid, patch: MemberPatch) -> OpResult<Member> {
        let changes = encode_payload(&patch)?;
        let stored = self
            .store
            .update(Table::Profiles, id, changes, Returning::Row)
            .await
            .map_err(map_store_error)?;
        let member: Member = decode_payload(stored)?;
        replace_by_id(&mut self.members, |m| m.id == id, member.clone());
        self.sort_members();
        Ok(member)
    }

    /// Remove a member profile. The auth identity is not deleted; the
    /// account keeps existing without a profile row.
    pub async fn delete_member(&mut self, id: Uuid) -> OpResult<()> {
        self.store
            .delete(Table::Profiles, id)
            .await
            .map_err(map_store_error)?;
        self.members.retain(|m| m.id != id);
        info!(%id, "member profile deleted; the auth identity remains");
        Ok(())
    }

    /// Record a payment.
    pub async fn add_payment(&mut self, draft: NewPayment) -> OpResult<Payment> {
        let row = encode_payload(&draft)?;
        let stored = self
            .store
            .insert(
                Table::Payments,
                row,
                Returning::WithEmbed(PAYMENT_EMBED.to_owned()),
            )
            .await
            .map_err(map_store_error)?;
        let payment = Payment::from(decode_payload::<PaymentRow>(stored)?);
        self.payments.push(payment.clone());
        self.sort_payments();
        Ok(payment)
    }

    /// Edit a payment.
    ///
    /// When the confirmed row arrives without its profile relation, the
    /// denormalized student fields are carried over from the local record
    /// instead of degrading to their defaults.
    pub async fn update_payment(&mut self, id: Uuid, patch: PaymentPatch) -> OpResult<Payment> {
        let changes = encode_payload(&patch)?;
        let stored = self
            .store
            .update(
                Table::Payments,
                id,
                changes,
                Returning::WithEmbed(PAYMENT_EMBED.to_owned()),
            )
            .await
            .map_err(map_store_error)?;
        let row: PaymentRow = decode_payload(stored)?;
        let had_embed = row.profile.is_some();
        let mut payment = Payment::from(row);
        if !had_embed {
            if let Some(existing) = self.payments.iter().find(|p| p.id == id) {
                payment.student_name = existing.student_name.clone();
                payment.student_id = existing.student_id.clone();
            }
        }
        replace_by_id(&mut self.payments, |p| p.id == id, payment.clone());
        self.sort_payments();
        Ok(payment)
    }

    /// A member's own payments, newest first.
    #[must_use]
    pub fn payments_for(&self, user_id: Uuid) -> Vec<&Payment> {
        self.payments
            .iter()
            .filter(|p| p.user_id == Some(user_id))
            .collect()
    }

    /// Sum of a member's pending payment amounts.
    #[must_use]
    pub fn pending_balance(&self, user_id: Uuid) -> f64 {
        self.sum_for(user_id, PaymentStatus::Pending)
    }

    /// Sum of a member's settled payment amounts.
    #[must_use]
    pub fn total_paid(&self, user_id: Uuid) -> f64 {
        self.sum_for(user_id, PaymentStatus::Paid)
    }

    fn sum_for(&self, user_id: Uuid, status: PaymentStatus) -> f64 {
        self.payments
            .iter()
            .filter(|p| p.user_id == Some(user_id) && p.status == status)
            .map(|p| p.amount)
            .sum()
    }

    /// Sum of every settled payment amount.
    #[must_use]
    pub fn total_revenue(&self) -> f64 {
        self.payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Paid)
            .map(|p| p.amount)
            .sum()
    }

    /// Events on or after `today`, ascending by date.
    #[must_use]
    pub fn upcoming_events(&self, today: NaiveDate) -> Vec<&Event> {
        self.events.iter().filter(|e| e.date >= today).collect()
    }

    /// Events falling on exactly `date`.
    #[must_use]
    pub fn events_on(&self, date: NaiveDate) -> Vec<&Event> {
        self.events.iter().filter(|e| e.date == date).collect()
    }

    /// Members whose membership expires inside the inclusive window
    /// `[today, today + within_days]`.
    #[must_use]
    pub fn expiring_memberships(&self, today: NaiveDate, within_days: i64) -> Vec<&Member> {
        let end = today + chrono::Duration::days(within_days);
        self.members
            .iter()
            .filter(|m| {
                m.membership_expiry
                    .is_some_and(|expiry| expiry >= today && expiry <= end)
            })
            .collect()
    }

    /// Case-insensitive member search over name, student id, and course,
    /// narrowed by the membership filter.
    #[must_use]
    pub fn search_members(&self, term: &str, filter: MembershipFilter) -> Vec<&Member> {
        let needle = term.to_lowercase();
        self.members
            .iter()
            .filter(|m| match filter {
                MembershipFilter::All => true,
                MembershipFilter::Paid => m.membership_paid,
                MembershipFilter::Unpaid => !m.membership_paid,
            })
            .filter(|m| {
                needle.is_empty()
                    || m.name.to_lowercase().contains(&needle)
                    || m.student_id
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                    || m.course
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Case-insensitive payment search over student name and transaction
    /// id, narrowed by an optional status.
    #[must_use]
    pub fn search_payments(&self, term: &str, status: Option<PaymentStatus>) -> Vec<&Payment> {
        let needle = term.to_lowercase();
        self.payments
            .iter()
            .filter(|p| status.is_none_or(|wanted| p.status == wanted))
            .filter(|p| {
                needle.is_empty()
                    || p.student_name.to_lowercase().contains(&needle)
                    || p.transaction_id
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

fn collect_or_logged<T>(result: Result<Vec<T>, StoreError>, table: Table) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, %table, "collection load failed");
            Vec::new()
        }
    }
}

fn replace_by_id<T>(records: &mut Vec<T>, matches: impl Fn(&T) -> bool, updated: T) {
    if let Some(index) = records.iter().position(matches) {
        if let Some(slot) = records.get_mut(index) {
            *slot = updated;
        }
    } else {
        records.push(updated);
    }
}

fn encode_payload<T: serde::Serialize>(payload: &T) -> OpResult<WireRow> {
    wire::encode(payload).map_err(map_store_error)
}

fn decode_payload<T: serde::de::DeserializeOwned>(row: WireRow) -> OpResult<T> {
    wire::decode(row).map_err(map_store_error)
}

fn map_store_error(error: StoreError) -> Error {
    match error {
        StoreError::Transport { message } | StoreError::Timeout { message } => {
            Error::unavailable(message)
        }
        StoreError::Unauthorized { message } => Error::unauthorized(message),
        StoreError::InvalidRequest { message } => Error::invalid_request(message),
        StoreError::NotFound { message } => Error::not_found(message),
        StoreError::Decode { message } => Error::internal(message),
    }
}
