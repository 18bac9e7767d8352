//! Free-enrolment workflow behaviour.

mod support;

use backend::domain::{ErrorCode, Role};
use support::Harness;

#[tokio::test]
async fn student_enrols_in_free_course() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let student = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let course = h.seed_course(instructor.id, "Intro to Rust", 0).await;

    let enrollment = h
        .enrollments
        .enroll_free(student.id, course.id)
        .await
        .expect("enrols");

    assert_eq!(enrollment.course_id, course.id);
    assert_eq!(enrollment.student_id, student.id);
    assert!(h.db.enrollment_exists(course.id, student.id));
}

#[tokio::test]
async fn repeat_enrolment_is_a_conflict() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let student = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let course = h.seed_course(instructor.id, "Intro to Rust", 0).await;

    h.enrollments
        .enroll_free(student.id, course.id)
        .await
        .expect("first enrolment succeeds");
    let err = h
        .enrollments
        .enroll_free(student.id, course.id)
        .await
        .expect_err("second enrolment fails");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "Already enrolled in this course");
}

#[tokio::test]
async fn paid_course_cannot_be_enrolled_directly() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let student = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let course = h.seed_course(instructor.id, "Advanced Rust", 49_900).await;

    let err = h
        .enrollments
        .enroll_free(student.id, course.id)
        .await
        .expect_err("paid course rejected");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[tokio::test]
async fn unknown_course_is_not_found() {
    let h = Harness::new();
    let student = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;

    let err = h
        .enrollments
        .enroll_free(student.id, backend::domain::CourseId::random())
        .await
        .expect_err("missing course rejected");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn unenrol_removes_the_record_and_count_reflects_it() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let student = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let course = h.seed_course(instructor.id, "Intro to Rust", 0).await;

    h.enrollments
        .enroll_free(student.id, course.id)
        .await
        .expect("enrols");
    assert_eq!(
        h.enrollments.enrollment_count(course.id).await.expect("counts"),
        1
    );

    h.enrollments
        .unenroll(student.id, course.id)
        .await
        .expect("unenrols");
    assert!(!h.db.enrollment_exists(course.id, student.id));

    // The cached count was invalidated by the change.
    assert_eq!(
        h.enrollments.enrollment_count(course.id).await.expect("counts"),
        0
    );
}

#[tokio::test]
async fn unenrolling_twice_is_not_found() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let student = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let course = h.seed_course(instructor.id, "Intro to Rust", 0).await;

    h.enrollments
        .enroll_free(student.id, course.id)
        .await
        .expect("enrols");
    h.enrollments
        .unenroll(student.id, course.id)
        .await
        .expect("unenrols");

    let err = h
        .enrollments
        .unenroll(student.id, course.id)
        .await
        .expect_err("nothing left to remove");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn student_enrolment_list_is_cached_and_invalidated() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let student = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;
    let first = h.seed_course(instructor.id, "Course One", 0).await;
    let second = h.seed_course(instructor.id, "Course Two", 0).await;

    h.enrollments
        .enroll_free(student.id, first.id)
        .await
        .expect("enrols");
    let listed = h
        .enrollments
        .enrollments_for_student(student.id)
        .await
        .expect("lists");
    assert_eq!(listed.len(), 1);

    // A second enrolment must show up despite the earlier cached read.
    h.enrollments
        .enroll_free(student.id, second.id)
        .await
        .expect("enrols again");
    let listed = h
        .enrollments
        .enrollments_for_student(student.id)
        .await
        .expect("lists");
    assert_eq!(listed.len(), 2);
}
