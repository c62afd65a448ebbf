use serde::Serialize;
use tribac_core::error::TribacError;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), TribacError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
