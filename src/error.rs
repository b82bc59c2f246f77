use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("unable to open the pod")]
    Storage,
    #[display("unable to set up the sensor")]
    Sensor,
    #[display("unable to open the ledger")]
    Ledger,
    #[display("harvest stopped")]
    Harvest,
    #[display("verification failed")]
    Verify,
}
