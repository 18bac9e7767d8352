//! Diesel table definitions, kept in lockstep with the migrations.

diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Text,
        email -> Text,
        password_hash -> Nullable<Text>,
        roles -> Array<Text>,
        profile_completed -> Bool,
        payout_id -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    courses (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        instructor_id -> Uuid,
        thumbnail_url -> Text,
        thumbnail_external_id -> Text,
        videos -> Jsonb,
        price_minor_units -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    enrollments (id) {
        id -> Uuid,
        course_id -> Uuid,
        student_id -> Uuid,
        enrolled_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        student_id -> Uuid,
        course_id -> Uuid,
        amount_minor_units -> Int8,
        order_id -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tickets (id) {
        id -> Uuid,
        user_id -> Uuid,
        roles_at_request -> Array<Text>,
        requested_role -> Text,
        status -> Text,
        resolved_by -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(enrollments -> courses (course_id));

diesel::allow_tables_to_appear_in_same_query!(users, courses, enrollments, payments, tickets);
