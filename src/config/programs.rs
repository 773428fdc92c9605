//! Bank/program catalog persistence
//!
//! Layout under the programs group:
//!
//! ```text
//! Programs/<bank id>          = <bank name>
//! Programs/Bank_<bank id>/<prog id> = <program name>
//! ```

use super::Config;
use crate::programs::Programs;
use crate::settings::{parse_int_or_zero, SettingsBackend, StoreResult};
use tracing::debug;

pub const PROGRAMS_GROUP: &str = "/Programs";
pub const BANK_PREFIX: &str = "/Bank_";

impl<B: SettingsBackend> Config<B> {
    /// Replace `programs` with the catalog stored in settings
    pub fn load_programs(&mut self, programs: &mut Programs) -> StoreResult<()> {
        programs.clear_banks();

        let mut g = self.settings.group(PROGRAMS_GROUP);
        for bank_key in g.child_keys()? {
            let bank_id = parse_int_or_zero(&bank_key) as u16;
            let bank_name = g.string(&bank_key, "")?;
            let bank = programs.add_bank(bank_id, bank_name);

            let bank_group = g.group(&format!("{}{}", BANK_PREFIX, bank_key));
            for prog_key in bank_group.child_keys()? {
                let prog_id = parse_int_or_zero(&prog_key) as u16;
                let prog_name = bank_group.string(&prog_key, "")?;
                bank.add_prog(prog_id, prog_name);
            }
        }

        debug!("Loaded {} program banks", programs.len());
        Ok(())
    }

    /// Clear the stored catalog and write `programs` in its place
    pub fn save_programs(&mut self, programs: &Programs) -> StoreResult<()> {
        self.clear_programs()?;

        {
            let mut g = self.settings.group(PROGRAMS_GROUP);
            for bank in programs.banks() {
                let bank_key = bank.id().to_string();
                g.set_value(&bank_key, bank.name())?;

                let mut bank_group = g.group(&format!("{}{}", BANK_PREFIX, bank_key));
                for prog in bank.progs() {
                    bank_group.set_value(&prog.id().to_string(), prog.name())?;
                }
            }
        }

        self.settings.flush()?;
        debug!("Saved {} program banks", programs.len());
        Ok(())
    }

    /// Remove every stored bank and each bank's programs
    pub fn clear_programs(&mut self) -> StoreResult<()> {
        let mut g = self.settings.group(PROGRAMS_GROUP);
        for bank_key in g.child_keys()? {
            {
                let mut bank_group = g.group(&format!("{}{}", BANK_PREFIX, bank_key));
                for prog_key in bank_group.child_keys()? {
                    bank_group.remove(&prog_key)?;
                }
            }
            g.remove(&bank_key)?;
        }
        Ok(())
    }
}
