//! SQL schema for the corpus store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS movies (
    id             TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    year           TEXT,
    imdb_rating    REAL,
    num_imdb_votes INTEGER,
    UNIQUE (id, title)          -- target of characters(movie_id, movie_title)
);

-- Name-keyed; ids are assigned by SQLite.
CREATE TABLE IF NOT EXISTS genres (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS movie_genres (
    movie_id TEXT    NOT NULL REFERENCES movies(id),
    genre_id INTEGER NOT NULL REFERENCES genres(id),
    PRIMARY KEY (movie_id, genre_id)
);

CREATE TABLE IF NOT EXISTS characters (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    movie_id    TEXT NOT NULL,
    movie_title TEXT NOT NULL,
    gender      TEXT,
    credit_pos  INTEGER,
    UNIQUE (id, name),          -- target of lines(character_id, character_name)
    FOREIGN KEY (movie_id, movie_title) REFERENCES movies(id, title)
);

-- Ids are the 1-based file position of the source record.
CREATE TABLE IF NOT EXISTS conversations (
    id             INTEGER PRIMARY KEY,
    first_char_id  TEXT NOT NULL REFERENCES characters(id),
    second_char_id TEXT NOT NULL REFERENCES characters(id),
    movie_id       TEXT NOT NULL REFERENCES movies(id)
);

-- Participant set. Always contains both named participants.
CREATE TABLE IF NOT EXISTS convs_chars (
    conversation_id INTEGER NOT NULL REFERENCES conversations(id),
    character_id    TEXT    NOT NULL REFERENCES characters(id),
    PRIMARY KEY (conversation_id, character_id)
);

CREATE TABLE IF NOT EXISTS lines (
    id              TEXT PRIMARY KEY,
    character_id    TEXT NOT NULL,
    character_name  TEXT NOT NULL,
    movie_id        TEXT NOT NULL REFERENCES movies(id),
    conversation_id INTEGER REFERENCES conversations(id),
    text            TEXT,
    FOREIGN KEY (character_id, character_name) REFERENCES characters(id, name)
);

CREATE INDEX IF NOT EXISTS characters_movie_idx     ON characters(movie_id);
CREATE INDEX IF NOT EXISTS conversations_movie_idx  ON conversations(movie_id);
CREATE INDEX IF NOT EXISTS conversations_first_idx  ON conversations(first_char_id);
CREATE INDEX IF NOT EXISTS conversations_second_idx ON conversations(second_char_id);
CREATE INDEX IF NOT EXISTS convs_chars_char_idx     ON convs_chars(character_id);
CREATE INDEX IF NOT EXISTS lines_character_idx      ON lines(character_id, character_name);
CREATE INDEX IF NOT EXISTS lines_conversation_idx   ON lines(conversation_id);
CREATE INDEX IF NOT EXISTS lines_movie_idx          ON lines(movie_id);

PRAGMA user_version = 1;
";
