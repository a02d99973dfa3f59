//! Diesel schema for task persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Sequence-assigned task identifier.
        id -> Int8,
        /// Short task name.
        #[max_length = 50]
        name -> Varchar,
        /// Optional free-form details.
        #[max_length = 512]
        details -> Nullable<Varchar>,
        /// Resolution timestamp.
        resolved_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp, unset until the first update.
        updated_at -> Nullable<Timestamptz>,
    }
}
