//! In-memory fakes for the driven ports, plus a wired service harness.
//!
//! The fakes enforce the same uniqueness rules as the real store so the
//! conflict paths behave identically.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;

use backend::domain::ports::{
    CacheError, CourseRepository, EnrollmentRepository, GatewayOrder, KeyValueCache, MailMessage,
    MediaHost, MediaHostError, MediaKind, Notifier, NotifyError, PasswordHashError,
    PasswordHasher, PaymentGateway, PaymentGatewayError, PaymentRepository, StoreError,
    TicketRepository, UploadedAsset, UserRepository,
};
use backend::domain::{
    AccountService, CachePolicy, CatalogueService, Course, CourseId, Enrollment, EnrollmentId,
    EnrollmentService, Notifications, OrderId, PageNumber, Payment, PaymentId, PaymentStatus,
    Price, Role, RoleSet, ThumbnailAsset, Ticket, TicketId, TicketService, TicketStatus,
    TokenIssuer, User, UserId,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    payments: Vec<Payment>,
    tickets: Vec<Ticket>,
}

/// One in-memory store implementing every repository port.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
}

impl MemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn payment_status(&self, order: &OrderId) -> Option<PaymentStatus> {
        self.tables
            .lock()
            .expect("lock")
            .payments
            .iter()
            .find(|p| p.order_id == *order)
            .map(|p| p.status)
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.tables
            .lock()
            .expect("lock")
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    pub fn enrollment_exists(&self, course: CourseId, student: UserId) -> bool {
        self.tables
            .lock()
            .expect("lock")
            .enrollments
            .iter()
            .any(|e| e.course_id == course && e.student_id == student)
    }
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::duplicate("users_email_unique"));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.user(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables
            .lock()
            .expect("lock")
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_roles(
        &self,
        id: UserId,
        roles: &RoleSet,
        profile_completed: bool,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.roles = roles.clone();
            user.profile_completed = profile_completed;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_payout_id(&self, id: UserId, payout_id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.payout_id = Some(payout_id.to_owned());
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: UserId, hash: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.password_hash = Some(hash.to_owned());
        }
        Ok(())
    }
}

fn page_slice<T: Clone>(items: &[T], page: PageNumber) -> Vec<T> {
    items
        .iter()
        .skip(usize::try_from(page.offset()).expect("offset fits"))
        .take(usize::try_from(page.limit()).expect("limit fits"))
        .cloned()
        .collect()
}

#[async_trait]
impl CourseRepository for MemoryDb {
    async fn insert(&self, course: &Course) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if tables
            .courses
            .iter()
            .any(|c| c.title.eq_ignore_ascii_case(&course.title))
        {
            return Err(StoreError::duplicate("courses_title_unique"));
        }
        tables.courses.push(course.clone());
        Ok(())
    }

    async fn update(&self, course: &Course) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if tables
            .courses
            .iter()
            .any(|c| c.id != course.id && c.title.eq_ignore_ascii_case(&course.title))
        {
            return Err(StoreError::duplicate("courses_title_unique"));
        }
        if let Some(existing) = tables.courses.iter_mut().find(|c| c.id == course.id) {
            *existing = course.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: CourseId) -> Result<(), StoreError> {
        self.tables
            .lock()
            .expect("lock")
            .courses
            .retain(|c| c.id != id);
        Ok(())
    }

    async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, StoreError> {
        Ok(self
            .tables
            .lock()
            .expect("lock")
            .courses
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_page(&self, page: PageNumber) -> Result<Vec<Course>, StoreError> {
        let tables = self.tables.lock().expect("lock");
        let mut courses = tables.courses.clone();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_slice(&courses, page))
    }

    async fn list_by_instructor(
        &self,
        instructor: UserId,
        page: PageNumber,
    ) -> Result<Vec<Course>, StoreError> {
        let tables = self.tables.lock().expect("lock");
        let mut courses: Vec<Course> = tables
            .courses
            .iter()
            .filter(|c| c.instructor_id == instructor)
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_slice(&courses, page))
    }

    async fn list_enrolled(
        &self,
        student: UserId,
        page: PageNumber,
    ) -> Result<Vec<Course>, StoreError> {
        let tables = self.tables.lock().expect("lock");
        let mut enrolled: Vec<(chrono::DateTime<Utc>, Course)> = tables
            .enrollments
            .iter()
            .filter(|e| e.student_id == student)
            .filter_map(|e| {
                tables
                    .courses
                    .iter()
                    .find(|c| c.id == e.course_id)
                    .map(|c| (e.enrolled_at, c.clone()))
            })
            .collect();
        enrolled.sort_by(|a, b| b.0.cmp(&a.0));
        let courses: Vec<Course> = enrolled.into_iter().map(|(_, c)| c).collect();
        Ok(page_slice(&courses, page))
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryDb {
    async fn insert(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if tables
            .enrollments
            .iter()
            .any(|e| e.course_id == enrollment.course_id && e.student_id == enrollment.student_id)
        {
            return Err(StoreError::duplicate("enrollments_course_student_unique"));
        }
        tables.enrollments.push(enrollment.clone());
        Ok(())
    }

    async fn find(
        &self,
        course: CourseId,
        student: UserId,
    ) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .tables
            .lock()
            .expect("lock")
            .enrollments
            .iter()
            .find(|e| e.course_id == course && e.student_id == student)
            .cloned())
    }

    async fn delete(&self, id: EnrollmentId) -> Result<(), StoreError> {
        self.tables
            .lock()
            .expect("lock")
            .enrollments
            .retain(|e| e.id != id);
        Ok(())
    }

    async fn list_for_student(&self, student: UserId) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .tables
            .lock()
            .expect("lock")
            .enrollments
            .iter()
            .filter(|e| e.student_id == student)
            .cloned()
            .collect())
    }

    async fn count_for_course(&self, course: CourseId) -> Result<u64, StoreError> {
        Ok(self
            .tables
            .lock()
            .expect("lock")
            .enrollments
            .iter()
            .filter(|e| e.course_id == course)
            .count() as u64)
    }
}

#[async_trait]
impl PaymentRepository for MemoryDb {
    async fn insert(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if tables
            .payments
            .iter()
            .any(|p| p.order_id == payment.order_id)
        {
            return Err(StoreError::duplicate("payments_order_id_unique"));
        }
        tables.payments.push(payment.clone());
        Ok(())
    }

    async fn find_for_verification(
        &self,
        order: &OrderId,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .tables
            .lock()
            .expect("lock")
            .payments
            .iter()
            .find(|p| p.order_id == *order && p.student_id == student && p.course_id == course)
            .cloned())
    }

    async fn set_status(&self, id: PaymentId, status: PaymentStatus) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if let Some(payment) = tables.payments.iter_mut().find(|p| p.id == id) {
            payment.status = status;
            payment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn fail_created(&self, order: &OrderId, student: UserId) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if let Some(payment) = tables.payments.iter_mut().find(|p| {
            p.order_id == *order && p.student_id == student && p.status == PaymentStatus::Created
        }) {
            payment.status = PaymentStatus::Failed;
            payment.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl TicketRepository for MemoryDb {
    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if tables
            .tickets
            .iter()
            .any(|t| t.user_id == ticket.user_id && t.status == TicketStatus::Created)
        {
            return Err(StoreError::duplicate("tickets_one_open_per_user"));
        }
        tables.tickets.push(ticket.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .tables
            .lock()
            .expect("lock")
            .tickets
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn find_open_for_user(&self, user: UserId) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .tables
            .lock()
            .expect("lock")
            .tickets
            .iter()
            .find(|t| t.user_id == user && t.status == TicketStatus::Created)
            .cloned())
    }

    async fn resolve(
        &self,
        id: TicketId,
        status: TicketStatus,
        resolved_by: UserId,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("lock");
        if let Some(ticket) = tables.tickets.iter_mut().find(|t| t.id == id) {
            ticket.status = status;
            ticket.resolved_by = Some(resolved_by);
            ticket.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_open(&self, page: PageNumber) -> Result<(Vec<Ticket>, u64), StoreError> {
        let tables = self.tables.lock().expect("lock");
        let mut open: Vec<Ticket> = tables
            .tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Created)
            .cloned()
            .collect();
        open.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let total = open.len() as u64;
        Ok((page_slice(&open, page), total))
    }
}

/// In-memory cache honouring TTLs and prefix-glob patterns.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
    failing: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Simulate a cache outage for subsequent calls.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().expect("lock").contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock").len()
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::backend("simulated outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        let mut entries = self.entries.lock().expect("lock");
        match entries.get(key) {
            Some((_, Some(deadline))) if *deadline <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.check()?;
        self.entries.lock().expect("lock").insert(
            key.to_owned(),
            (value.to_owned(), Some(Instant::now() + ttl)),
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        self.check()?;
        let mut entries = self.entries.lock().expect("lock");
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.check()?;
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .entries
            .lock()
            .expect("lock")
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn increment(&self, key: &str) -> Result<i64, CacheError> {
        self.check()?;
        let mut entries = self.entries.lock().expect("lock");
        let (current, deadline) = entries
            .get(key)
            .map(|(v, d)| (v.parse::<i64>().unwrap_or(0), *d))
            .unwrap_or((0, None));
        let next = current + 1;
        entries.insert(key.to_owned(), (next.to_string(), deadline));
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        self.check()?;
        let mut entries = self.entries.lock().expect("lock");
        if let Some((_, deadline)) = entries.get_mut(key) {
            *deadline = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        self.check()?;
        let entries = self.entries.lock().expect("lock");
        Ok(entries.get(key).and_then(|(_, deadline)| {
            deadline.map(|d| d.saturating_duration_since(Instant::now()))
        }))
    }
}

/// Gateway fake with deterministic order ids and signatures.
#[derive(Default)]
pub struct StubGateway {
    counter: AtomicU64,
    pub receipts: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl StubGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The signature `expected_signature` would produce, for use in tests.
    pub fn sign(order: &OrderId, payment_id: &str) -> String {
        format!("sig:{order}|{payment_id}")
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PaymentGatewayError::unavailable("simulated outage"));
        }
        self.receipts
            .lock()
            .expect("lock")
            .push(receipt.to_owned());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let order_id = OrderId::new(format!("order_test_{n}")).expect("valid order id");
        Ok(GatewayOrder {
            order_id,
            amount_minor_units,
            currency: currency.to_owned(),
        })
    }

    fn expected_signature(&self, order_id: &OrderId, payment_id: &str) -> String {
        Self::sign(order_id, payment_id)
    }
}

/// Media host fake recording uploads and deletions.
#[derive(Default)]
pub struct StubMediaHost {
    counter: AtomicU64,
    pub uploads: Mutex<Vec<String>>,
    pub deletions: Mutex<Vec<String>>,
    fail_video_uploads: AtomicBool,
}

impl StubMediaHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_video_uploads(&self, failing: bool) {
        self.fail_video_uploads.store(failing, Ordering::SeqCst);
    }

    fn next_asset(&self, prefix: &str) -> UploadedAsset {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let external_id = format!("{prefix}_{n}");
        self.uploads.lock().expect("lock").push(external_id.clone());
        UploadedAsset {
            url: format!("https://media.test/{external_id}"),
            external_id,
        }
    }
}

#[async_trait]
impl MediaHost for StubMediaHost {
    async fn upload_image(
        &self,
        _filename: &str,
        _bytes: Vec<u8>,
    ) -> Result<UploadedAsset, MediaHostError> {
        Ok(self.next_asset("img"))
    }

    async fn upload_video(
        &self,
        _filename: &str,
        _bytes: Vec<u8>,
    ) -> Result<UploadedAsset, MediaHostError> {
        if self.fail_video_uploads.load(Ordering::SeqCst) {
            return Err(MediaHostError::upload("simulated outage"));
        }
        Ok(self.next_asset("vid"))
    }

    async fn delete(&self, external_id: &str, _kind: MediaKind) -> Result<(), MediaHostError> {
        self.deletions
            .lock()
            .expect("lock")
            .push(external_id.to_owned());
        Ok(())
    }
}

/// Mail fake recording every message.
#[derive(Default)]
pub struct StubNotifier {
    pub messages: Mutex<Vec<MailMessage>>,
}

impl StubNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.messages.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Notifier for StubNotifier {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        self.messages.lock().expect("lock").push(message.clone());
        Ok(())
    }
}

/// Transparent "hash" for tests.
pub struct StubHasher;

#[async_trait]
impl PasswordHasher for StubHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(format!("hashed:{password}"))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        Ok(hash == format!("hashed:{password}"))
    }
}

/// Fully wired services over the fakes.
pub struct Harness {
    pub db: Arc<MemoryDb>,
    pub cache: Arc<MemoryCache>,
    pub gateway: Arc<StubGateway>,
    pub media: Arc<StubMediaHost>,
    pub mailer: Arc<StubNotifier>,
    pub catalogue: Arc<CatalogueService>,
    pub enrollments: Arc<EnrollmentService>,
    pub tickets: Arc<TicketService>,
    pub accounts: Arc<AccountService>,
    pub tokens: TokenIssuer,
}

impl Harness {
    pub fn new() -> Self {
        let db = MemoryDb::new();
        let cache = MemoryCache::new();
        let gateway = StubGateway::new();
        let media = StubMediaHost::new();
        let mailer = StubNotifier::new();

        let policy = CachePolicy::new(cache.clone() as Arc<dyn KeyValueCache>);
        let notifications = Notifications::new(mailer.clone() as Arc<dyn Notifier>);
        let tokens = TokenIssuer::new("test-secret");

        let catalogue = Arc::new(CatalogueService::new(
            db.clone(),
            db.clone(),
            db.clone(),
            media.clone(),
            policy.clone(),
        ));
        let enrollments = Arc::new(EnrollmentService::new(
            db.clone(),
            db.clone(),
            db.clone(),
            gateway.clone(),
            policy.clone(),
        ));
        let tickets = Arc::new(TicketService::new(
            db.clone(),
            db.clone(),
            notifications.clone(),
            policy.clone(),
        ));
        let accounts = Arc::new(AccountService::new(
            db.clone(),
            Arc::new(StubHasher),
            tokens.clone(),
            cache.clone() as Arc<dyn KeyValueCache>,
            policy,
            notifications,
            "https://app.test".to_owned(),
        ));

        Self {
            db,
            cache,
            gateway,
            media,
            mailer,
            catalogue,
            enrollments,
            tickets,
            accounts,
            tokens,
        }
    }

    /// Insert a user with the given roles directly into the store.
    pub async fn seed_user(&self, name: &str, email: &str, roles: &[Role]) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::random(),
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash: Some("hashed:Str0ng@pass".to_owned()),
            roles: roles.iter().copied().collect(),
            profile_completed: true,
            payout_id: None,
            created_at: now,
            updated_at: now,
        };
        UserRepository::insert(self.db.as_ref(), &user)
            .await
            .expect("user seeded");
        user
    }

    /// Insert a course directly into the store.
    pub async fn seed_course(
        &self,
        instructor: UserId,
        title: &str,
        price_minor_units: i64,
    ) -> Course {
        let now = Utc::now();
        let course = Course {
            id: CourseId::random(),
            title: title.to_owned(),
            description: "A seeded course".to_owned(),
            instructor_id: instructor,
            thumbnail: ThumbnailAsset {
                url: "https://media.test/seed_thumb".to_owned(),
                external_id: "seed_thumb".to_owned(),
            },
            videos: Vec::new(),
            price: Price::from_minor_units(price_minor_units).expect("valid price"),
            created_at: now,
            updated_at: now,
        };
        CourseRepository::insert(self.db.as_ref(), &course)
            .await
            .expect("course seeded");
        course
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
