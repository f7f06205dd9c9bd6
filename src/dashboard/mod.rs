//! Parent dashboard orchestration.
//!
//! [`Dashboard::open`] walks the parent → student → class → teacher chain,
//! derives test statuses and labels, and keeps a live announcement feed
//! running for as long as the returned [`DashboardSession`] is alive.
//!
//! Store faults never escape `open`: missing or unreadable records leave
//! the dependent fields at their defaults and are logged.

pub mod announcements;
pub mod setup;
pub mod teachers;
pub mod view;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use crate::derive::names::{format_parent_label, parent_last_name};
use crate::error::SetupError;
use crate::navigation::NavigationIntent;
use crate::records::{AnnouncementRecord, ClassRecord, ParentRecord, StudentRecord};
use crate::store::{
    self, ANNOUNCEMENTS, CLASSES, PARENTS, RealtimeStore, STUDENTS, Subscription, TEACHERS,
};

use announcements::visible_announcements;
use setup::{ProfileForm, SetupPrompt};
use teachers::TeacherIndex;
use view::{AnnouncementItem, DashboardView, TestProgress};

pub struct Dashboard<S> {
    store: Arc<S>,
}

impl<S: RealtimeStore + 'static> Dashboard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Loads everything the dashboard shows for `parent_id`.
    ///
    /// `needs_setup` forces the profile-setup form even when the stored
    /// profile is complete.
    #[tracing::instrument(skip(self), fields(parent_id = %parent_id))]
    pub async fn open(&self, parent_id: &str, needs_setup: bool) -> DashboardSession<S> {
        let (teachers, parent) = tokio::join!(
            self.load_teachers(),
            self.load::<ParentRecord>(PARENTS, parent_id)
        );

        let Some(parent) = parent else {
            info!("Parent record not found, dashboard stays empty");
            let view = Arc::new(watch::channel(DashboardView::empty(parent_id)).0);
            return DashboardSession::new(parent_id, self.store.clone(), None, view, None);
        };

        let setup = (needs_setup || parent.is_incomplete()).then(|| SetupPrompt::prefill(&parent));
        if setup.is_some() {
            debug!(forced = needs_setup, "Profile setup required");
        }

        let student = match parent.student_id() {
            Some(id) => self.load::<StudentRecord>(STUDENTS, id).await,
            None => None,
        };
        let class_id = student
            .as_ref()
            .and_then(|s| s.class_id())
            .map(str::to_string);
        let class = match class_id.as_deref() {
            Some(id) => self.load::<ClassRecord>(CLASSES, id).await,
            None => None,
        };

        let teachers = Arc::new(teachers);
        let student = student.unwrap_or_default();
        let view = DashboardView {
            parent_label: format_parent_label(student.display_name()),
            parent_last_name: parent_last_name(parent.name.as_deref()),
            teacher_label: teachers.display_name(class.and_then(|c| c.teacher_id).as_deref()),
            setup,
            pretest: TestProgress::from_scores(&student.pre_score()),
            post_test: TestProgress::from_scores(&student.post_score()),
            loaded: true,
            ..DashboardView::empty(parent_id)
        };
        info!(
            class_id = class_id.as_deref().unwrap_or(""),
            pretest = %view.pretest.status,
            post_test = %view.post_test.status,
            setup_required = view.setup_required(),
            "Dashboard loaded"
        );

        let view = Arc::new(watch::channel(view).0);
        let feed = match class_id {
            Some(class_id) => self.follow_announcements(class_id, teachers, view.clone()).await,
            None => None,
        };

        DashboardSession::new(parent_id, self.store.clone(), Some(parent), view, feed)
    }

    /// Fetches `collection/id`, treating every failure as "not there".
    async fn load<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Option<T> {
        let path = match store::record_path(collection, id) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Skipping fetch");
                return None;
            }
        };

        match store::fetch_record(self.store.as_ref(), &path).await {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                debug!(path = %path, "Record not found");
                None
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Record fetch failed");
                None
            }
        }
    }

    async fn load_teachers(&self) -> TeacherIndex {
        match store::fetch_collection(self.store.as_ref(), TEACHERS).await {
            Ok(all) => {
                let index = TeacherIndex::from_collection(all);
                if index.is_empty() {
                    debug!("No teachers on record");
                } else {
                    debug!(count = index.len(), "Teacher index loaded");
                }
                index
            }
            Err(e) => {
                warn!(error = %e, "Teacher index unavailable");
                TeacherIndex::default()
            }
        }
    }

    async fn follow_announcements(
        &self,
        class_id: String,
        teachers: Arc<TeacherIndex>,
        view: Arc<watch::Sender<DashboardView>>,
    ) -> Option<JoinHandle<()>> {
        match self.store.subscribe(ANNOUNCEMENTS).await {
            Ok(subscription) => {
                let span = tracing::info_span!("announcement_feed", class_id = %class_id);
                Some(tokio::spawn(
                    feed_announcements(subscription, class_id, teachers, view).instrument(span),
                ))
            }
            Err(e) => {
                warn!(error = %e, "Announcement subscription failed");
                None
            }
        }
    }
}

/// Replaces the announcement list on every snapshot until the feed ends.
async fn feed_announcements(
    mut subscription: Subscription,
    class_id: String,
    teachers: Arc<TeacherIndex>,
    view: Arc<watch::Sender<DashboardView>>,
) {
    while let Some(snapshot) = subscription.next().await {
        let all = match store::decode_collection::<AnnouncementRecord>(ANNOUNCEMENTS, snapshot) {
            Ok(all) => all,
            Err(e) => {
                warn!(error = %e, "Ignoring announcement snapshot");
                continue;
            }
        };

        let items: Vec<AnnouncementItem> = visible_announcements(all, &class_id)
            .into_iter()
            .map(|record| AnnouncementItem::from_record(record, &teachers))
            .collect();
        debug!(count = items.len(), "Announcements updated");

        view.send_modify(|v| v.announcements = items);
    }
    debug!(path = subscription.path(), "Announcement feed ended");
}

/// A dashboard opened for one parent.
///
/// Dropping the session (or calling [`DashboardSession::close`]) stops the
/// announcement feed and releases its subscription.
pub struct DashboardSession<S> {
    parent_id: String,
    store: Arc<S>,
    parent: Option<ParentRecord>,
    view: Arc<watch::Sender<DashboardView>>,
    feed: Option<JoinHandle<()>>,
}

impl<S: RealtimeStore> DashboardSession<S> {
    fn new(
        parent_id: &str,
        store: Arc<S>,
        parent: Option<ParentRecord>,
        view: Arc<watch::Sender<DashboardView>>,
        feed: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            parent_id: parent_id.to_string(),
            store,
            parent,
            view,
            feed,
        }
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    /// Receiver that is notified whenever the view changes.
    pub fn watch(&self) -> watch::Receiver<DashboardView> {
        self.view.subscribe()
    }

    /// True while the announcement feed is running.
    pub fn is_live(&self) -> bool {
        self.feed.as_ref().is_some_and(|feed| !feed.is_finished())
    }

    /// Reopens the profile form prefilled from the stored profile.
    pub fn edit_profile(&self) {
        let prompt = self
            .parent
            .as_ref()
            .map(SetupPrompt::prefill)
            .unwrap_or_default();
        self.view.send_modify(|v| v.setup = Some(prompt));
    }

    /// Validates `form` and overwrites the parent record with it.
    ///
    /// On success the view is updated in place and the form is dismissed.
    /// On failure nothing local changes; a blank name or contact is rejected
    /// before the store is contacted.
    #[tracing::instrument(skip(self, form), fields(parent_id = %self.parent_id))]
    pub async fn submit_profile(&mut self, form: &ProfileForm) -> Result<(), SetupError> {
        let current = self.parent.clone().unwrap_or_default();
        let updated = form.apply_to(&current)?;

        let path = store::record_path(PARENTS, &self.parent_id).map_err(SetupError::Write)?;
        if let Err(e) = store::write_record(self.store.as_ref(), &path, &updated).await {
            error!(error = %e, "Profile update rejected");
            return Err(SetupError::Write(e));
        }

        let last_name = parent_last_name(updated.name.as_deref());
        self.parent = Some(updated);
        self.view.send_modify(|v| {
            v.parent_last_name = last_name;
            v.setup = None;
        });
        info!("Profile updated");
        Ok(())
    }

    pub fn home_exercise(&self) -> NavigationIntent {
        NavigationIntent::HomeExercise
    }

    /// Ends the session and asks the host to return to role selection.
    pub fn logout(self) -> NavigationIntent {
        self.close();
        NavigationIntent::Logout
    }

    pub fn close(mut self) {
        self.stop_feed();
    }
}

impl<S> DashboardSession<S> {
    fn stop_feed(&mut self) {
        if let Some(feed) = self.feed.take() {
            debug!(parent_id = %self.parent_id, "Stopping announcement feed");
            feed.abort();
        }
    }
}

impl<S> Drop for DashboardSession<S> {
    fn drop(&mut self) {
        self.stop_feed();
    }
}
