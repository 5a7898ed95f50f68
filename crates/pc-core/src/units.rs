// pc-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, Area as UomArea, Length as UomLength, Mass as UomMass,
    MassDensity as UomMassDensity, MassRate as UomMassRate, Pressure as UomPressure,
    Ratio as UomRatio, ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
    Velocity as UomVelocity, Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type Accel = UomAcceleration;
pub type Area = UomArea;
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Density = UomMassDensity;
pub type MassRate = UomMassRate;
pub type Pressure = UomPressure;
pub type Ratio = UomRatio;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;
pub type Velocity = UomVelocity;
pub type Volume = UomVolume;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn m2(v: f64) -> Area {
    use uom::si::area::square_meter;
    Area::new::<square_meter>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

/// Area of a circle of the given diameter.
#[inline]
pub fn circle_area(diameter: Length) -> Area {
    std::f64::consts::FRAC_PI_4 * diameter * diameter
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;
    /// Universal gas constant, J/(mol K).
    pub const R_UNIVERSAL: f64 = 8.314_462_618;
    pub const P_ATM_PA: f64 = 101_325.0;
    pub const T_STANDARD_K: f64 = 298.15;
    /// Molar mass of dry air, g/mol.
    pub const MW_AIR: f64 = 28.97;
    /// Stefan-Boltzmann constant, W/(m^2 K^4).
    pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;
    pub const VON_KARMAN: f64 = 0.4;
    /// Metres per degree of latitude.
    pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::meter_per_second_squared;
        Accel::new::<meter_per_second_squared>(G0_MPS2)
    }

    #[inline]
    pub fn p_atm() -> Pressure {
        pa(P_ATM_PA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _t = k(300.0);
        let _mdot = kgps(1.2);
        let _l = m(2.0);
        let _a = m2(0.5);
        let _v = m3(10.0);
        let _u = mps(5.0);
        let _mass = kg(3.0);
        let _dt = s(0.1);
        let _r = unitless(0.5);
        let _g0 = constants::g0();
    }

    #[test]
    fn bar_and_circle_area() {
        assert!((bar(80.0).value - 8.0e6).abs() < 1e-6);
        let a = circle_area(m(0.1));
        assert!((a.value - 7.853_981_634e-3).abs() < 1e-12);
    }
}
