//! Catalogue workflows and cache consistency behaviour.

mod support;

use backend::domain::{
    CourseUpdate, ErrorCode, MediaUpload, NewCourse, NewVideo, PageNumber, Price, Role,
};
use support::Harness;

fn upload(name: &str) -> MediaUpload {
    MediaUpload {
        filename: name.to_owned(),
        bytes: vec![1, 2, 3],
    }
}

fn new_course(title: &str, price: f64, videos: usize) -> NewCourse {
    NewCourse {
        title: title.to_owned(),
        description: "Learn things properly".to_owned(),
        price: Price::from_major_units(price).expect("valid price"),
        thumbnail: upload("thumb.png"),
        videos: (0..videos)
            .map(|n| NewVideo {
                title: format!("Lesson {n}"),
                upload: upload(&format!("lesson{n}.mp4")),
            })
            .collect(),
        payout_id: None,
    }
}

#[tokio::test]
async fn create_uploads_media_and_stores_the_course() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;

    let course = h
        .catalogue
        .create(instructor.id, new_course("Intro to Rust", 0.0, 2))
        .await
        .expect("created");

    assert_eq!(course.videos.len(), 2);
    assert_eq!(h.media.uploads.lock().expect("lock").len(), 3);
    assert!(course.thumbnail.url.starts_with("https://media.test/"));
}

#[tokio::test]
async fn duplicate_title_conflicts_and_discards_fresh_uploads() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    h.catalogue
        .create(instructor.id, new_course("Intro to Rust", 0.0, 0))
        .await
        .expect("first created");

    let err = h
        .catalogue
        .create(instructor.id, new_course("INTRO TO RUST", 0.0, 1))
        .await
        .expect_err("duplicate title rejected");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "A course with this title already exists");
    // Thumbnail and video from the failed attempt were deleted again.
    let deletions = h.media.deletions.lock().expect("lock").clone();
    assert_eq!(deletions.len(), 2);
}

#[tokio::test]
async fn failed_video_upload_rolls_back_earlier_uploads() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    h.media.fail_video_uploads(true);

    let err = h
        .catalogue
        .create(instructor.id, new_course("Intro to Rust", 0.0, 1))
        .await
        .expect_err("video upload fails");

    assert_eq!(err.code(), ErrorCode::Upstream);
    // The already-uploaded thumbnail was discarded.
    let uploads = h.media.uploads.lock().expect("lock").clone();
    let deletions = h.media.deletions.lock().expect("lock").clone();
    assert_eq!(uploads, deletions);
}

#[tokio::test]
async fn paid_course_requires_a_payout_account() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;

    let err = h
        .catalogue
        .create(instructor.id, new_course("Advanced Rust", 499.0, 0))
        .await
        .expect_err("no payout account yet");
    assert_eq!(err.code(), ErrorCode::InvalidState);

    // Supplying a payout id with the course persists it to the instructor.
    let mut with_payout = new_course("Advanced Rust", 499.0, 0);
    with_payout.payout_id = Some("acct_123".to_owned());
    h.catalogue
        .create(instructor.id, with_payout)
        .await
        .expect("created with payout in the request");
    let stored = h.db.user(instructor.id).expect("user exists");
    assert_eq!(stored.payout_id.as_deref(), Some("acct_123"));

    // A later paid course without one reuses the stored id.
    h.catalogue
        .create(instructor.id, new_course("Advanced Tokio", 499.0, 0))
        .await
        .expect("created against the stored payout id");
}

#[tokio::test]
async fn listing_is_served_from_cache_until_invalidated() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    h.catalogue
        .create(instructor.id, new_course("Course One", 0.0, 0))
        .await
        .expect("created");

    let first = h.catalogue.list(PageNumber::FIRST).await.expect("lists");
    assert_eq!(first.len(), 1);

    // Bypass the service; the cache must now be stale.
    h.seed_course(instructor.id, "Course Two", 0).await;
    let cached = h.catalogue.list(PageNumber::FIRST).await.expect("lists");
    assert_eq!(cached.len(), 1, "stale read comes from the cache");

    // A mutation through the service drops every listing key.
    h.catalogue
        .create(instructor.id, new_course("Course Three", 0.0, 0))
        .await
        .expect("created");
    let fresh = h.catalogue.list(PageNumber::FIRST).await.expect("lists");
    assert_eq!(fresh.len(), 3);
}

#[tokio::test]
async fn cache_outage_degrades_reads_instead_of_failing() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    h.seed_course(instructor.id, "Course One", 0).await;

    h.cache.set_failing(true);
    let courses = h.catalogue.list(PageNumber::FIRST).await.expect("lists");
    assert_eq!(courses.len(), 1);
}

#[tokio::test]
async fn update_replaces_thumbnail_and_deletes_the_old_one() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let course = h
        .catalogue
        .create(instructor.id, new_course("Intro to Rust", 0.0, 0))
        .await
        .expect("created");
    let old_thumb = course.thumbnail.external_id.clone();

    let updated = h
        .catalogue
        .update(
            instructor.id,
            course.id,
            CourseUpdate {
                new_thumbnail: Some(upload("fresh.png")),
                ..CourseUpdate::default()
            },
        )
        .await
        .expect("updated");

    assert_ne!(updated.thumbnail.external_id, old_thumb);
    assert!(h
        .media
        .deletions
        .lock()
        .expect("lock")
        .contains(&old_thumb));
}

#[tokio::test]
async fn only_the_owner_may_modify_a_course() {
    let h = Harness::new();
    let owner = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let other = h.seed_user("Omar", "omar@example.com", &[Role::Instructor]).await;
    let course = h
        .catalogue
        .create(owner.id, new_course("Intro to Rust", 0.0, 0))
        .await
        .expect("created");

    let err = h
        .catalogue
        .update(other.id, course.id, CourseUpdate::default())
        .await
        .expect_err("not the owner");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn delete_removes_the_course_and_its_media() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let course = h
        .catalogue
        .create(instructor.id, new_course("Intro to Rust", 0.0, 2))
        .await
        .expect("created");

    h.catalogue
        .delete(instructor.id, course.id)
        .await
        .expect("deleted");

    let err = h.catalogue.detail(course.id).await.expect_err("gone");
    assert_eq!(err.code(), ErrorCode::NotFound);
    // Thumbnail plus both videos were removed from the host.
    assert_eq!(h.media.deletions.lock().expect("lock").len(), 3);
}

#[tokio::test]
async fn remove_video_deletes_exactly_that_asset() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let course = h
        .catalogue
        .create(instructor.id, new_course("Intro to Rust", 0.0, 2))
        .await
        .expect("created");
    let victim = course.videos[0].clone();

    let updated = h
        .catalogue
        .remove_video(instructor.id, course.id, victim.id)
        .await
        .expect("video removed");

    assert_eq!(updated.videos.len(), 1);
    assert!(h
        .media
        .deletions
        .lock()
        .expect("lock")
        .contains(&victim.external_id));

    let err = h
        .catalogue
        .remove_video(instructor.id, course.id, victim.id)
        .await
        .expect_err("already gone");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn detail_includes_enrolment_count_and_misses_are_not_cached() {
    let h = Harness::new();
    let instructor = h.seed_user("Ines", "ines@example.com", &[Role::Instructor]).await;
    let student = h.seed_user("Sam", "sam@example.com", &[Role::Student]).await;

    let missing = backend::domain::CourseId::random();
    let err = h.catalogue.detail(missing).await.expect_err("not found");
    assert_eq!(err.code(), ErrorCode::NotFound);

    // Creating the course under the same id afterwards must be visible
    // immediately; nothing negative was cached.
    let course = h.seed_course(instructor.id, "Intro to Rust", 0).await;
    h.enrollments
        .enroll_free(student.id, course.id)
        .await
        .expect("enrols");

    let detail = h.catalogue.detail(course.id).await.expect("found");
    assert_eq!(detail.enrollment_count, 1);
}
