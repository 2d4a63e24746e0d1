//! Flat string ids, matching the `nanoid()`-keyed identifiers the source
//! assigns to tasks, programs, and vehicles — no phantom typing, just a
//! generator.

const ALPHABET: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b',
    'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u',
    'v', 'w', 'x', 'y', 'z',
];

/// A 10-character alphanumeric id, the size the source uses for task ids.
pub fn new_task_id() -> String {
    nanoid::nanoid!(10, &ALPHABET)
}

/// A 10-character alphanumeric id, used for programs and vehicles alike.
pub fn new_entity_id() -> String {
    nanoid::nanoid!(10, &ALPHABET)
}

/// A 21-character default-alphabet id, used where uniqueness matters more
/// than brevity (shuttle ids).
pub fn new_shuttle_id() -> String {
    nanoid::nanoid!()
}
