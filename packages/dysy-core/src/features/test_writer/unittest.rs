use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::features::driver::TestSink;

const INDENT: &str = "  ";

/// `unittest` module writer over any byte sink
///
/// Write errors inside [`TestSink::on_call`] are held back and returned
/// by [`UnittestWriter::finish`].
pub struct UnittestWriter<W: Write> {
    out: W,
    calls_written: usize,
    methods: usize,
    start_new: bool,
    error: Option<io::Error>,
}

impl UnittestWriter<BufWriter<File>> {
    /// Create `<output_dir>/Test_<module>_Test.py`
    pub fn create(output_dir: impl AsRef<Path>, module: &str) -> io::Result<(Self, PathBuf)> {
        let path = output_dir.as_ref().join(Self::file_name(module));
        let file = File::create(&path)?;
        debug!(path = %path.display(), "Writing test module");
        Ok((Self::new(BufWriter::new(file), module)?, path))
    }
}

impl<W: Write> UnittestWriter<W> {
    pub fn file_name(module: &str) -> String {
        format!("Test_{}_Test.py", module)
    }

    /// Write the module header importing `module`
    pub fn new(mut out: W, module: &str) -> io::Result<Self> {
        write!(
            out,
            "import {}\nimport unittest\n\nclass RandomTestCases(unittest.TestCase) :\n\n",
            module
        )?;
        Ok(Self {
            out,
            calls_written: 0,
            methods: 0,
            start_new: true,
            error: None,
        })
    }

    pub fn calls_written(&self) -> usize {
        self.calls_written
    }

    pub fn methods(&self) -> usize {
        self.methods
    }

    fn write_call(&mut self, call_text: &str) -> io::Result<()> {
        if self.start_new {
            self.methods += 1;
            write!(self.out, "\n{}def test{}(self) :\n", INDENT, self.methods)?;
            self.start_new = false;
        }
        writeln!(self.out, "{}{}{}", INDENT, INDENT, call_text)?;
        self.calls_written += 1;
        Ok(())
    }

    /// Close the class, append the runner trailer and hand back the sink
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        if self.calls_written == 0 {
            writeln!(self.out, "{}{}pass", INDENT, INDENT)?;
        }
        write!(
            self.out,
            "\nif __name__ == '__main__':\n\
             {i}unittest.main()\n\
             {i}suite = unittest.TestLoader().loadTestsFromTestCase(RandomTestCases)\n\
             {i}unittest.TextTestRunner(verbosity=2).run(suite)\n",
            i = INDENT
        )?;
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> TestSink for UnittestWriter<W> {
    fn on_call(&mut self, call_text: &str, is_new: bool) {
        if call_text.is_empty() {
            self.start_new = true;
            return;
        }
        if !is_new || self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_call(call_text) {
            warn!(error = %e, "Failed to write test call");
            self.error = Some(e);
        }
    }
}
