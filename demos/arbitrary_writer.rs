//! Example demonstrating arbitrary writer usage
//!
//! The writer never seeks, so the output can be anything implementing
//! `Write`: an in-memory buffer, a pipe, a socket.
//!
//! `.finish()` returns the writer, allowing you to extract the ZIP bytes or
//! keep using the stream.

use std::io::{Cursor, Write};
use zipstream::{Result, ZipStreamReader, ZipStreamWriter};

/// Write sink that only counts bytes, standing in for a network stream
struct CountingSink(u64);

impl Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    // Example 1: Write ZIP to in-memory buffer
    println!("Example 1: Writing ZIP to in-memory buffer...");
    let mut zip = ZipStreamWriter::from_writer(Vec::new());
    zip.add_content("hello.txt", b"Hello from in-memory ZIP!")?;
    zip.add_content("data.txt", b"Some data in the second file.")?;
    let zip_bytes = zip.finish()?;
    println!("✓ Created in-memory ZIP ({} bytes)", zip_bytes.len());

    // Example 2: Non-seekable sink
    println!("\nExample 2: Writing to a write-only sink...");
    let mut zip2 = ZipStreamWriter::from_writer(CountingSink(0));
    let large_data = "Hello World! ".repeat(1000);
    zip2.add_content("compressed.txt", large_data.as_bytes())?;
    let sink = zip2.finish()?;
    println!("✓ Streamed {} bytes without seeking", sink.0);

    // Example 3: Archive appended after existing bytes
    println!("\nExample 3: Writing after a prefix...");
    let mut buffer = b"PREFIX_".to_vec();
    let mut zip3 = ZipStreamWriter::from_writer(&mut buffer);
    zip3.add_content("after_prefix.txt", b"This ZIP starts after the prefix")?;
    zip3.finish()?;
    println!(
        "✓ Created ZIP after prefix ({} bytes total, {} prefix)",
        buffer.len(),
        "PREFIX_".len()
    );

    // Offsets are relative to the start of the archive, so skip the prefix to read it
    let mut reader = ZipStreamReader::from_reader(Cursor::new(&buffer["PREFIX_".len()..]));
    while let Some(record) = reader.next_file()? {
        println!(
            "  {}: {:?}",
            record.filename_lossy(),
            String::from_utf8_lossy(&record.content()?)
        );
    }

    Ok(())
}
