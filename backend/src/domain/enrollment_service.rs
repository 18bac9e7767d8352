//! Enrolment workflows: free enrolment, paid checkout, and payment
//! verification.
//!
//! Idempotency rests on two store constraints: one enrolment per
//! `(course, student)` pair and one payment record per gateway order.
//! Verification re-runs safely; any error on the way out moves a still-open
//! payment to `failed`.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::cache::CachePolicy;
use super::cache_keys;
use super::enrollment::Enrollment;
use super::error::Error;
use super::ids::CourseId;
use super::ids::UserId;
use super::payment::{OrderId, Payment, PaymentStatus};
use super::ports::{
    CourseRepository, EnrollmentRepository, PaymentGateway, PaymentRepository, StoreError,
};

/// Currency every order is denominated in.
const ORDER_CURRENCY: &str = "INR";

/// An order opened for a paid course, handed back to the client so it can
/// drive the gateway's checkout flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOrder {
    pub order_id: OrderId,
    pub amount_minor_units: i64,
    pub currency: String,
}

/// Everything the client submits after the gateway confirms a payment.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub student: UserId,
    pub course_id: CourseId,
    pub order_id: OrderId,
    pub payment_id: String,
    pub signature: String,
}

/// Successful verification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The payment was already `paid`; nothing changed.
    AlreadyVerified,
    /// The payment was marked `paid` but the enrolment already existed.
    AlreadyEnrolled,
    /// The payment was marked `paid` and the enrolment created.
    Enrolled(Enrollment),
}

/// Enrolment and payment workflows.
pub struct EnrollmentService {
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    cache: CachePolicy,
}

impl EnrollmentService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        cache: CachePolicy,
    ) -> Self {
        Self {
            courses,
            enrollments,
            payments,
            gateway,
            cache,
        }
    }

    /// Enrol a student in a free course.
    ///
    /// Paid courses must go through checkout; a repeat enrolment is a
    /// conflict whether caught by the pre-check or by the store's unique
    /// index.
    pub async fn enroll_free(
        &self,
        student: UserId,
        course_id: CourseId,
    ) -> Result<Enrollment, Error> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| Error::not_found("Course not found"))?;
        if !course.price.is_free() {
            return Err(Error::invalid_state(
                "This course is paid; complete checkout to enroll",
            ));
        }
        if self.enrollments.find(course_id, student).await?.is_some() {
            return Err(Error::conflict("Already enrolled in this course"));
        }

        let enrollment = Enrollment::new(course_id, student);
        match self.enrollments.insert(&enrollment).await {
            Ok(()) => {}
            Err(err) if err.is_duplicate() => {
                return Err(Error::conflict("Already enrolled in this course"));
            }
            Err(err) => return Err(err.into()),
        }
        self.cache.after_enrollment_change(student, course_id).await;
        Ok(enrollment)
    }

    /// Remove a student's enrolment.
    pub async fn unenroll(&self, student: UserId, course_id: CourseId) -> Result<(), Error> {
        let enrollment = self
            .enrollments
            .find(course_id, student)
            .await?
            .ok_or_else(|| Error::not_found("Enrollment not found"))?;
        self.enrollments.delete(enrollment.id).await?;
        self.cache.after_enrollment_change(student, course_id).await;
        Ok(())
    }

    /// A student's enrolment records, cached read-through.
    pub async fn enrollments_for_student(
        &self,
        student: UserId,
    ) -> Result<Vec<Enrollment>, Error> {
        let enrollments = Arc::clone(&self.enrollments);
        self.cache
            .read_through(
                &cache_keys::student_enrollments(student),
                cache_keys::READ_TTL,
                || async move {
                    enrollments
                        .list_for_student(student)
                        .await
                        .map_err(Error::from)
                },
            )
            .await
    }

    /// How many students a course has, cached read-through.
    pub async fn enrollment_count(&self, course: CourseId) -> Result<u64, Error> {
        let enrollments = Arc::clone(&self.enrollments);
        self.cache
            .read_through(
                &cache_keys::enrollment_count(course),
                cache_keys::READ_TTL,
                || async move {
                    enrollments
                        .count_for_course(course)
                        .await
                        .map_err(Error::from)
                },
            )
            .await
    }

    /// Open a gateway order for a paid course and record the payment in the
    /// `created` state.
    pub async fn create_payment_order(
        &self,
        student: UserId,
        course_id: CourseId,
    ) -> Result<CheckoutOrder, Error> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| Error::not_found("Course not found"))?;
        if course.price.is_free() {
            return Err(Error::invalid_state(
                "This course is free; enroll directly",
            ));
        }
        if self.enrollments.find(course_id, student).await?.is_some() {
            return Err(Error::conflict("Already enrolled in this course"));
        }

        let order = self
            .gateway
            .create_order(
                course.price.minor_units(),
                ORDER_CURRENCY,
                &checkout_receipt(course_id),
            )
            .await?;

        let payment = Payment::open(student, course_id, course.price, order.order_id.clone());
        match self.payments.insert(&payment).await {
            Ok(()) => {}
            Err(err) if err.is_duplicate() => {
                return Err(Error::conflict("An order with this id already exists"));
            }
            Err(err) => return Err(err.into()),
        }

        Ok(CheckoutOrder {
            order_id: order.order_id,
            amount_minor_units: order.amount_minor_units,
            currency: order.currency,
        })
    }

    /// Verify a gateway payment and enrol the student.
    ///
    /// Safe to call repeatedly with the same order: an already-`paid`
    /// payment short-circuits to success. Every error exit best-effort
    /// moves a still-open payment to `failed` so the record never sticks in
    /// `created`.
    pub async fn verify_payment(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationOutcome, Error> {
        let outcome = self.verify_payment_inner(&request).await;
        if outcome.is_err() {
            if let Err(err) = self
                .payments
                .fail_created(&request.order_id, request.student)
                .await
            {
                warn!(order_id = %request.order_id, error = %err,
                    "could not mark payment failed");
            }
        }
        outcome
    }

    async fn verify_payment_inner(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, Error> {
        let payment = self
            .payments
            .find_for_verification(&request.order_id, request.student, request.course_id)
            .await?
            .ok_or_else(|| Error::not_found("Payment record not found"))?;

        match payment.status {
            PaymentStatus::Paid => return Ok(VerificationOutcome::AlreadyVerified),
            PaymentStatus::Failed => {
                return Err(Error::invalid_state("Payment has already failed"));
            }
            PaymentStatus::Created => {}
        }

        let expected = self
            .gateway
            .expected_signature(&request.order_id, &request.payment_id);
        if expected != request.signature {
            return Err(Error::invalid_signature("Invalid payment signature"));
        }

        self.payments
            .set_status(payment.id, PaymentStatus::Paid)
            .await?;

        let enrollment = Enrollment::new(request.course_id, request.student);
        let outcome = match self.enrollments.insert(&enrollment).await {
            Ok(()) => VerificationOutcome::Enrolled(enrollment),
            Err(StoreError::Duplicate(_)) => VerificationOutcome::AlreadyEnrolled,
            Err(err) => return Err(err.into()),
        };
        self.cache
            .after_enrollment_change(request.student, request.course_id)
            .await;
        Ok(outcome)
    }
}

/// Gateway receipts are capped at 40 characters, so the full course UUID
/// plus a timestamp will not fit. 24 hex characters of the course id plus
/// the millisecond clock keep the reference traceable and within bounds.
fn checkout_receipt(course_id: CourseId) -> String {
    let course = course_id.as_uuid().simple().to_string();
    format!("{}_{}", &course[..24], Utc::now().timestamp_millis())
}
