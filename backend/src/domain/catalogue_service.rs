//! Course catalogue workflows: authoring, media lifecycle, and cached
//! listings.
//!
//! Media uploads happen before the store write so a failed write can still
//! discard the fresh assets; old assets are only deleted after the write
//! succeeds. Title uniqueness is enforced case-insensitively by the store.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use super::cache::CachePolicy;
use super::cache_keys;
use super::course::{Course, CourseDetail, Price, ThumbnailAsset, VideoAsset};
use super::error::Error;
use super::ids::{CourseId, UserId};
use super::pagination::PageNumber;
use super::ports::{
    CourseRepository, EnrollmentRepository, MediaHost, MediaKind, UserRepository,
};

/// Raw media bytes submitted by the instructor.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A lecture video to be uploaded alongside its title.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub upload: MediaUpload,
}

/// Everything needed to publish a course.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub thumbnail: MediaUpload,
    pub videos: Vec<NewVideo>,
    /// Payout account to persist on the instructor before publishing a
    /// paid course; ignored for free courses.
    pub payout_id: Option<String>,
}

/// Partial update to an existing course. `None` fields are left unchanged;
/// `new_videos` are appended.
#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub new_thumbnail: Option<MediaUpload>,
    pub new_videos: Vec<NewVideo>,
}

/// Catalogue workflows.
pub struct CatalogueService {
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    users: Arc<dyn UserRepository>,
    media: Arc<dyn MediaHost>,
    cache: CachePolicy,
}

impl CatalogueService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        users: Arc<dyn UserRepository>,
        media: Arc<dyn MediaHost>,
        cache: CachePolicy,
    ) -> Self {
        Self {
            courses,
            enrollments,
            users,
            media,
            cache,
        }
    }

    /// Publish a new course.
    pub async fn create(&self, instructor: UserId, input: NewCourse) -> Result<Course, Error> {
        let title = input.title.trim().to_owned();
        if title.is_empty() {
            return Err(Error::invalid_request("Title is required"));
        }
        if input.description.trim().is_empty() {
            return Err(Error::invalid_request("Description is required"));
        }
        if input.thumbnail.bytes.is_empty() {
            return Err(Error::invalid_request("Thumbnail is required"));
        }
        if !input.price.is_free() {
            // A payout id supplied with the course is persisted to the
            // instructor; otherwise the stored one must already exist.
            match input.payout_id.as_deref().map(str::trim) {
                Some(payout_id) if !payout_id.is_empty() => {
                    self.users.update_payout_id(instructor, payout_id).await?;
                }
                _ => {
                    let owner = self
                        .users
                        .find_by_id(instructor)
                        .await?
                        .ok_or_else(|| Error::not_found("User not found"))?;
                    if owner.payout_id.is_none() {
                        return Err(Error::invalid_state(
                            "Add a payout account before publishing a paid course",
                        ));
                    }
                }
            }
        }

        let mut uploaded: Vec<(String, MediaKind)> = Vec::new();

        let thumbnail = match self
            .media
            .upload_image(&input.thumbnail.filename, input.thumbnail.bytes)
            .await
        {
            Ok(asset) => asset,
            Err(err) => return Err(err.into()),
        };
        uploaded.push((thumbnail.external_id.clone(), MediaKind::Image));

        let mut videos = Vec::with_capacity(input.videos.len());
        for video in input.videos {
            match self
                .media
                .upload_video(&video.upload.filename, video.upload.bytes)
                .await
            {
                Ok(asset) => {
                    uploaded.push((asset.external_id.clone(), MediaKind::Video));
                    videos.push(VideoAsset {
                        id: Uuid::new_v4(),
                        title: video.title,
                        url: asset.url,
                        external_id: asset.external_id,
                        uploaded_at: Utc::now(),
                    });
                }
                Err(err) => {
                    self.discard_uploads(uploaded).await;
                    return Err(err.into());
                }
            }
        }

        let now = Utc::now();
        let course = Course {
            id: CourseId::random(),
            title,
            description: input.description,
            instructor_id: instructor,
            thumbnail: ThumbnailAsset {
                url: thumbnail.url,
                external_id: thumbnail.external_id,
            },
            videos,
            price: input.price,
            created_at: now,
            updated_at: now,
        };

        match self.courses.insert(&course).await {
            Ok(()) => {}
            Err(err) if err.is_duplicate() => {
                self.discard_uploads(uploaded).await;
                return Err(Error::conflict("A course with this title already exists"));
            }
            Err(err) => {
                self.discard_uploads(uploaded).await;
                return Err(err.into());
            }
        }

        self.cache.after_course_mutation(course.id, instructor).await;
        Ok(course)
    }

    /// Update an owned course.
    ///
    /// A replacement thumbnail is uploaded first and the old one deleted
    /// only after the store write succeeds, so a failure never leaves the
    /// course pointing at a dead asset.
    pub async fn update(
        &self,
        instructor: UserId,
        course_id: CourseId,
        update: CourseUpdate,
    ) -> Result<Course, Error> {
        let mut course = self.require_owned(instructor, course_id).await?;

        let mut fresh: Vec<(String, MediaKind)> = Vec::new();
        let mut replaced_thumbnail: Option<String> = None;

        if let Some(upload) = update.new_thumbnail {
            let asset = self.media.upload_image(&upload.filename, upload.bytes).await?;
            fresh.push((asset.external_id.clone(), MediaKind::Image));
            replaced_thumbnail = Some(course.thumbnail.external_id.clone());
            course.thumbnail = ThumbnailAsset {
                url: asset.url,
                external_id: asset.external_id,
            };
        }

        for video in update.new_videos {
            match self
                .media
                .upload_video(&video.upload.filename, video.upload.bytes)
                .await
            {
                Ok(asset) => {
                    fresh.push((asset.external_id.clone(), MediaKind::Video));
                    course.videos.push(VideoAsset {
                        id: Uuid::new_v4(),
                        title: video.title,
                        url: asset.url,
                        external_id: asset.external_id,
                        uploaded_at: Utc::now(),
                    });
                }
                Err(err) => {
                    self.discard_uploads(fresh).await;
                    return Err(err.into());
                }
            }
        }

        if let Some(title) = update.title {
            let title = title.trim().to_owned();
            if title.is_empty() {
                self.discard_uploads(fresh).await;
                return Err(Error::invalid_request("Title is required"));
            }
            course.title = title;
        }
        if let Some(description) = update.description {
            if description.trim().is_empty() {
                self.discard_uploads(fresh).await;
                return Err(Error::invalid_request("Description is required"));
            }
            course.description = description;
        }
        if let Some(price) = update.price {
            course.price = price;
        }
        course.updated_at = Utc::now();

        match self.courses.update(&course).await {
            Ok(()) => {}
            Err(err) if err.is_duplicate() => {
                self.discard_uploads(fresh).await;
                return Err(Error::conflict("A course with this title already exists"));
            }
            Err(err) => {
                self.discard_uploads(fresh).await;
                return Err(err.into());
            }
        }

        if let Some(old) = replaced_thumbnail {
            self.discard_uploads(vec![(old, MediaKind::Image)]).await;
        }
        self.cache.after_course_mutation(course_id, instructor).await;
        Ok(course)
    }

    /// Delete an owned course along with its hosted media.
    pub async fn delete(&self, instructor: UserId, course_id: CourseId) -> Result<(), Error> {
        let course = self.require_owned(instructor, course_id).await?;

        self.media
            .delete(&course.thumbnail.external_id, MediaKind::Image)
            .await?;
        for video in &course.videos {
            self.media.delete(&video.external_id, MediaKind::Video).await?;
        }

        self.courses.delete(course_id).await?;
        self.cache.after_course_mutation(course_id, instructor).await;
        Ok(())
    }

    /// Remove one lecture video from an owned course.
    pub async fn remove_video(
        &self,
        instructor: UserId,
        course_id: CourseId,
        video_id: Uuid,
    ) -> Result<Course, Error> {
        let mut course = self.require_owned(instructor, course_id).await?;
        let position = course
            .videos
            .iter()
            .position(|video| video.id == video_id)
            .ok_or_else(|| Error::not_found("Video not found"))?;

        let video = course.videos.remove(position);
        self.media.delete(&video.external_id, MediaKind::Video).await?;

        course.updated_at = Utc::now();
        self.courses.update(&course).await?;
        self.cache.after_course_mutation(course_id, instructor).await;
        Ok(course)
    }

    /// One page of the public catalogue, cached read-through.
    pub async fn list(&self, page: PageNumber) -> Result<Vec<Course>, Error> {
        let courses = Arc::clone(&self.courses);
        self.cache
            .read_through(
                &cache_keys::course_list_page(page),
                cache_keys::READ_TTL,
                || async move { courses.list_page(page).await.map_err(Error::from) },
            )
            .await
    }

    /// One page of an instructor's own courses, cached read-through.
    pub async fn instructor_courses(
        &self,
        instructor: UserId,
        page: PageNumber,
    ) -> Result<Vec<Course>, Error> {
        let courses = Arc::clone(&self.courses);
        self.cache
            .read_through(
                &cache_keys::instructor_courses_page(instructor, page),
                cache_keys::READ_TTL,
                || async move {
                    courses
                        .list_by_instructor(instructor, page)
                        .await
                        .map_err(Error::from)
                },
            )
            .await
    }

    /// One page of a student's enrolled courses, cached read-through.
    pub async fn student_courses(
        &self,
        student: UserId,
        page: PageNumber,
    ) -> Result<Vec<Course>, Error> {
        let courses = Arc::clone(&self.courses);
        self.cache
            .read_through(
                &cache_keys::student_courses_page(student, page),
                cache_keys::READ_TTL,
                || async move {
                    courses
                        .list_enrolled(student, page)
                        .await
                        .map_err(Error::from)
                },
            )
            .await
    }

    /// Course detail with its enrolment count, cached read-through.
    ///
    /// A missing course is an error from the loader, so "not found" is
    /// never cached.
    pub async fn detail(&self, course_id: CourseId) -> Result<CourseDetail, Error> {
        let courses = Arc::clone(&self.courses);
        let enrollments = Arc::clone(&self.enrollments);
        self.cache
            .read_through(
                &cache_keys::course_detail(course_id),
                cache_keys::READ_TTL,
                || async move {
                    let course = courses
                        .find_by_id(course_id)
                        .await?
                        .ok_or_else(|| Error::not_found("Course not found"))?;
                    let enrollment_count = enrollments.count_for_course(course_id).await?;
                    Ok(CourseDetail {
                        course,
                        enrollment_count,
                    })
                },
            )
            .await
    }

    async fn require_owned(
        &self,
        instructor: UserId,
        course_id: CourseId,
    ) -> Result<Course, Error> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| Error::not_found("Course not found"))?;
        if course.instructor_id != instructor {
            return Err(Error::forbidden("Not authorized to modify this course"));
        }
        Ok(course)
    }

    async fn discard_uploads(&self, uploads: Vec<(String, MediaKind)>) {
        for (external_id, kind) in uploads {
            if let Err(err) = self.media.delete(&external_id, kind).await {
                warn!(external_id, error = %err, "could not discard uploaded asset");
            }
        }
    }
}
