//! Read command implementation

use indicatif::{ProgressBar, ProgressStyle};
use qprobe_core::controller::QspiController;
use qprobe_core::session::{FlashSession, SessionConfig};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Default chunk size for reading (4 KiB)
const READ_CHUNK_SIZE: usize = 4096;

/// Run the read command
pub fn run_read(
    controller: Box<dyn QspiController>,
    address: u32,
    length: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if length == 0 {
        return Err("length must be greater than zero".into());
    }

    let mut session = FlashSession::open(controller, &SessionConfig::default())?;
    let data = read_region(&mut session, address, length)?;

    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(&data)?;
            println!("Wrote {} bytes to {:?}", data.len(), path);
        }
        None => {
            println!("Read {} bytes at 0x{:06X}:", data.len(), address);
            hex_dump(address, &data[..data.len().min(256)]);
            if data.len() > 256 {
                println!("... ({} more bytes, use --output to capture all)", data.len() - 256);
            }
        }
    }

    Ok(())
}

/// Read a region in controller-sized chunks with a progress bar
pub fn read_region(
    session: &mut FlashSession<Box<dyn QspiController>>,
    address: u32,
    length: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let chunk_limit = std::cmp::min(READ_CHUNK_SIZE, session.max_read_len());

    let pb = ProgressBar::new(length as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    let mut data = Vec::with_capacity(length);
    let mut offset = 0usize;
    while offset < length {
        let chunk_size = std::cmp::min(chunk_limit, length - offset);
        let result = session.read(address + offset as u32, chunk_size)?;
        data.extend_from_slice(result.payload());

        offset += chunk_size;
        pb.set_position(offset as u64);
    }

    pb.finish_and_clear();
    Ok(data)
}

/// Print a 16-bytes-per-line hex dump, addresses on the left
fn hex_dump(base: u32, data: &[u8]) {
    for (i, line) in data.chunks(16).enumerate() {
        print!("{:08X} ", base as usize + i * 16);
        for byte in line {
            print!(" {:02X}", byte);
        }
        println!();
    }
}
