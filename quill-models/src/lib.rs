#[macro_use]
extern crate diesel;
#[macro_use]
extern crate lazy_static;
#[cfg(test)]
#[macro_use]
extern crate diesel_migrations;

pub type Connection = diesel::PgConnection;

/// All the possible errors that can be encountered in this crate
#[derive(Debug)]
pub enum Error {
    Db(diesel::result::Error),
    InvalidValue,
    Io(std::io::Error),
    NotFound,
    Password(bcrypt::BcryptError),
    Unauthorized,
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            _ => Error::Db(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Password(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Adds a function to a model, that returns the first
/// matching row for a given list of fields.
///
/// Usage:
///
/// ```ignore
/// impl Model {
///     find_by!(model_table, name_of_the_function, field1 as String, field2 as i32);
/// }
///
/// // Get the Model with field1 == "", and field2 == 0
/// Model::name_of_the_function(connection, String::new(), 0);
/// ```
macro_rules! find_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// Try to find a $table with a given $col
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> Result<Self> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .first(conn)
                .map_err(Error::from)
        }
    };
}

/// List all rows of a model, with field-based filtering.
///
/// Usage:
///
/// ```ignore
/// impl Model {
///     list_by!(model_table, name_of_the_function, field1 as String);
/// }
///
/// // To get all Models with field1 == ""
/// Model::name_of_the_function(connection, String::new());
/// ```
macro_rules! list_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        /// Try to find a $table with a given $col
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> Result<Vec<Self>> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .load::<Self>(conn)
                .map_err(Error::from)
        }
    };
}

/// Adds a function to a model to retrieve a row by its id
///
/// Usage:
///
/// ```ignore
/// impl Model {
///     get!(model_table);
/// }
///
/// // Get the Model with id == 1
/// Model::get(connection, 1);
/// ```
macro_rules! get {
    ($table:ident) => {
        pub fn get(conn: &crate::Connection, id: i32) -> Result<Self> {
            $table::table
                .filter($table::id.eq(id))
                .first(conn)
                .map_err(Error::from)
        }
    };
}

/// Adds a function to a model to insert a new row
///
/// Usage:
///
/// ```ignore
/// impl Model {
///     insert!(model_table, NewModelType);
/// }
///
/// // Insert a new row
/// Model::insert(connection, NewModelType::new());
/// ```
macro_rules! insert {
    ($table:ident, $from:ty) => {
        pub fn insert(conn: &crate::Connection, new: $from) -> Result<Self> {
            diesel::insert_into($table::table)
                .values(new)
                .get_result(conn)
                .map_err(Error::from)
        }
    };
}

pub mod comments;
pub mod config;
pub mod db_conn;
pub mod follows;
pub mod groups;
pub mod medias;
pub mod posts;
pub mod safe_string;
pub mod schema;
pub mod users;
pub use self::config::CONFIG;

#[cfg(test)]
pub(crate) mod tests {
    use diesel::Connection as _;

    embed_migrations!("../migrations");

    pub fn db() -> crate::Connection {
        let conn = crate::Connection::establish(crate::CONFIG.database_url.as_str())
            .expect("Couldn't connect to the database");
        embedded_migrations::run(&conn).expect("Couldn't run migrations");
        conn
    }

    #[test]
    fn empty_test() {
        let conn = &db();
        conn.test_transaction::<_, (), _>(|| Ok(()));
    }
}
