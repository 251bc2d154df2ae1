//! Static catalog of every SWMM 5.2 input section, in emission order.

use super::{
    int, opt_int, real, rest, text, ColumnLayout, CustomSection, Encoding, Field,
    GeometryAssoc, KeywordLayout, Section, Variant, VariantFields, WideGroup, WideLayout,
    DEFAULT_KEYWORD, MAX_PARAMS,
};

const PROJECT: &str = "Project";
const CLIMATE: &str = "Climate";
const HYDROLOGY: &str = "Hydrology";
const NODES: &str = "Nodes";
const LINKS: &str = "Links";
const INLETS: &str = "Inlets";
const CURVES: &str = "Curves";
const WQ: &str = "WQ";
const BC: &str = "BC";
const CONTROLS: &str = "Controls";

const fn plain(name: &'static str, prefix: &'static str, encoding: Encoding) -> Section {
    Section {
        name,
        prefix,
        geometry: None,
        encoding,
        no_sort: false,
        gis_only: false,
        folded: false,
    }
}

const fn located(
    name: &'static str,
    prefix: &'static str,
    geometry: GeometryAssoc,
    encoding: Encoding,
) -> Section {
    Section {
        name,
        prefix,
        geometry: Some(geometry),
        encoding,
        no_sort: false,
        gis_only: false,
        folded: false,
    }
}

const fn unsorted(mut section: Section) -> Section {
    section.no_sort = true;
    section
}

const fn folded(mut section: Section) -> Section {
    section.folded = true;
    section
}

const fn gis_only(mut section: Section) -> Section {
    section.gis_only = true;
    section
}

const fn fixed(keyword: &'static str, fields: &'static [Field]) -> Variant {
    Variant {
        keyword,
        fields: VariantFields::Fixed(fields),
    }
}

const fn bare(keyword: &'static str) -> Variant {
    Variant {
        keyword,
        fields: VariantFields::None,
    }
}

const fn open(keyword: &'static str) -> Variant {
    Variant {
        keyword,
        fields: VariantFields::Open,
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

const FREE_TEXT: &[Field] = &[rest("Text")];
const OPTION_VALUE: &[Field] = &[text("Option"), rest("Value")];
const FILES: &[Field] = &[text("Action"), text("File_Type"), rest("File_Name")];
const EVENTS: &[Field] = &[
    text("Start_Date"),
    text("Start_Time"),
    text("End_Date"),
    text("End_Time"),
];

// ---------------------------------------------------------------------------
// Climate
// ---------------------------------------------------------------------------

const RAINGAGES: KeywordLayout = KeywordLayout {
    common_start: &[
        text("Name"),
        text("Format"),
        text("Interval"),
        real("SCF"),
        text("Source"),
    ],
    keyword_col: 4,
    variants: &[
        fixed("TIMESERIES", &[text("Tseries")]),
        fixed("FILE", &[text("Fname"), text("Station"), text("Units")]),
    ],
    common_end: &[],
    layout: ColumnLayout::Named,
};

const ONE: &[Field] = &[text("P")];
const TWO: &[Field] = &[text("P"), text("P")];
const SIX: &[Field] = &[text("P"); 6];
const ELEVEN: &[Field] = &[text("P"); 11];
const TWELVE: &[Field] = &[text("P"); 12];
const THIRTEEN: &[Field] = &[text("P"); 13];

const EVAPORATION: KeywordLayout = KeywordLayout {
    common_start: &[text("Format")],
    keyword_col: 0,
    variants: &[
        fixed("CONSTANT", ONE),
        fixed("MONTHLY", TWELVE),
        fixed("TIMESERIES", ONE),
        bare("TEMPERATURE"),
        open("FILE"),
        fixed("RECOVERY", ONE),
        fixed("DRY_ONLY", ONE),
    ],
    common_end: &[],
    layout: ColumnLayout::Positional,
};

const TEMPERATURE: KeywordLayout = KeywordLayout {
    common_start: &[text("Data_Element")],
    keyword_col: 0,
    variants: &[
        fixed("TIMESERIES", ONE),
        fixed("FILE", TWO),
        fixed("WINDSPEED", THIRTEEN),
        fixed("SNOWMELT", SIX),
        fixed("ADC", ELEVEN),
    ],
    common_end: &[],
    layout: ColumnLayout::Positional,
};

const ADJUSTMENTS: KeywordLayout = KeywordLayout {
    common_start: &[text("Parameter")],
    keyword_col: 0,
    variants: &[
        fixed("TEMPERATURE", TWELVE),
        fixed("EVAPORATION", TWELVE),
        fixed("RAINFALL", TWELVE),
        fixed("CONDUCTIVITY", TWELVE),
        fixed("N-PERV", TWO),
        fixed("DSTORE", TWO),
        fixed("INFIL", TWO),
    ],
    common_end: &[],
    layout: ColumnLayout::Positional,
};

// ---------------------------------------------------------------------------
// Hydrology
// ---------------------------------------------------------------------------

const SUBCATCHMENTS: &[Field] = &[
    text("Name"),
    text("Rain Gage"),
    text("Outlet"),
    real("Area"),
    real("PctImperv"),
    real("Width"),
    real("PctSlope"),
    real("CurbLen"),
    text("SnowPack"),
];

const SUBAREAS: &[Field] = &[
    text("Subcatchment"),
    real("N-Imperv"),
    real("N-Perv"),
    real("S-Imperv"),
    real("S-Perv"),
    real("PctZero"),
    text("RouteTo"),
    real("PctRouted"),
];

const INFILTRATION: &[Field] = &[
    text("Subcatchment"),
    real("Param1"),
    real("Param2"),
    real("Param3"),
    real("Param4"),
    real("Param5"),
    text("Method"),
];

const LID_CONTROLS: WideLayout = WideLayout {
    key: text("Name"),
    default: Some(text("Type")),
    groups: &[
        WideGroup {
            prefix: "SURFACE",
            fields: &[
                real("StorHt"),
                real("VegFrac"),
                real("Rough"),
                real("Slope"),
                real("Xslope"),
            ],
        },
        WideGroup {
            prefix: "SOIL",
            fields: &[
                real("Thick"),
                real("Por"),
                real("FC"),
                real("WP"),
                real("Ksat"),
                real("Kcoeff"),
                real("Suct"),
            ],
        },
        WideGroup {
            prefix: "PAVEMENT",
            fields: &[
                real("Thick"),
                real("Vratio"),
                real("FracImp"),
                real("Perm"),
                real("Vclog"),
                real("Treg"),
                real("Freg"),
            ],
        },
        WideGroup {
            prefix: "STORAGE",
            fields: &[
                real("Height"),
                real("Vratio"),
                real("Seepage"),
                real("Vclog"),
                text("Covrd"),
            ],
        },
        WideGroup {
            prefix: "DRAIN",
            fields: &[
                real("Coeff"),
                real("Expon"),
                real("Offset"),
                real("Delay"),
                real("Hopen"),
                real("Hclose"),
                text("Qcurve"),
            ],
        },
        WideGroup {
            prefix: "DRAINMAT",
            fields: &[real("Thick"), real("Vratio"), real("Rough")],
        },
        WideGroup {
            prefix: "REMOVALS",
            fields: &[rest("Pairs")],
        },
    ],
};

const LID_USAGE: &[Field] = &[
    text("Subcatchment"),
    text("LID_Process"),
    int("Number"),
    real("Area"),
    real("Width"),
    real("InitSat"),
    real("FromImp"),
    opt_int("ToPerv"),
    text("RptFile"),
    text("DrainTo"),
    real("FromPerv"),
];

const AQUIFERS: &[Field] = &[
    text("Name"),
    real("Por"),
    real("WP"),
    real("FC"),
    real("Ksat"),
    real("Kslope"),
    real("Tslope"),
    real("ETu"),
    real("ETs"),
    real("Seep"),
    real("Ebot"),
    real("Egw"),
    real("Umc"),
    text("ETupat"),
];

const GROUNDWATER: &[Field] = &[
    text("Subcatchment"),
    text("Aquifer"),
    text("Node"),
    real("Esurf"),
    real("A1"),
    real("B1"),
    real("A2"),
    real("B2"),
    real("A3"),
    real("Dsw"),
    real("Egwt"),
    real("Ebot"),
    real("Wgr"),
    real("Umc"),
];

const GWF: &[Field] = &[text("Subcatchment"), text("Flow_Type"), rest("Expression")];

const SNOW_SURFACE: &[Field] = &[
    real("Cmin"),
    real("Cmax"),
    real("Tbase"),
    real("FWF"),
    real("SD0"),
    real("FW0"),
    real("SNN0"),
];

const SNOWPACKS: WideLayout = WideLayout {
    key: text("Name"),
    default: None,
    groups: &[
        WideGroup {
            prefix: "PLOWABLE",
            fields: SNOW_SURFACE,
        },
        WideGroup {
            prefix: "IMPERVIOUS",
            fields: SNOW_SURFACE,
        },
        WideGroup {
            prefix: "PERVIOUS",
            fields: SNOW_SURFACE,
        },
        WideGroup {
            prefix: "REMOVAL",
            fields: &[
                real("Dplow"),
                real("Fout"),
                real("Fimp"),
                real("Fperv"),
                real("Fimelt"),
                real("Fsub"),
                text("Scatch"),
            ],
        },
    ],
};

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

const JUNCTIONS: &[Field] = &[
    text("Name"),
    real("Elev"),
    real("Ymax"),
    real("Y0"),
    real("Ysur"),
    real("Apond"),
];

const OUTFALLS: KeywordLayout = KeywordLayout {
    common_start: &[text("Name"), real("Elev"), text("Type")],
    keyword_col: 2,
    variants: &[
        bare("FREE"),
        bare("NORMAL"),
        fixed("FIXED", &[real("Stage")]),
        fixed("TIDAL", &[text("Tcurve")]),
        fixed("TIMESERIES", &[text("Tseries")]),
    ],
    common_end: &[text("Gated"), text("RouteTo")],
    layout: ColumnLayout::Named,
};

const DIVIDERS: KeywordLayout = KeywordLayout {
    common_start: &[text("Name"), real("Elev"), text("DivLink"), text("Type")],
    keyword_col: 3,
    variants: &[
        fixed("CUTOFF", &[real("Qmin")]),
        fixed("TABULAR", &[text("Dcurve")]),
        fixed("WEIR", &[real("Qmin"), real("Ht"), real("Cd")]),
        bare("OVERFLOW"),
    ],
    common_end: &[real("Ymax"), real("Y0"), real("Ysur"), real("Apond")],
    layout: ColumnLayout::Named,
};

const STORAGE_SHAPE: &[Field] = &[real("L"), real("W"), real("Z")];

const STORAGE: KeywordLayout = KeywordLayout {
    common_start: &[
        text("Name"),
        real("Elev"),
        real("Ymax"),
        real("Y0"),
        text("Shape"),
    ],
    keyword_col: 4,
    variants: &[
        fixed("FUNCTIONAL", &[real("Coeff"), real("Expon"), real("Const")]),
        fixed("TABULAR", &[text("Acurve")]),
        fixed("CYLINDRICAL", STORAGE_SHAPE),
        fixed("CONICAL", STORAGE_SHAPE),
        fixed("PARABOLIC", STORAGE_SHAPE),
        fixed("PYRAMIDAL", STORAGE_SHAPE),
    ],
    common_end: &[
        real("Ysur"),
        real("Fevap"),
        real("Psi"),
        real("Ksat"),
        real("IMD"),
    ],
    layout: ColumnLayout::Named,
};

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

const CONDUITS: &[Field] = &[
    text("Name"),
    text("From Node"),
    text("To Node"),
    real("Length"),
    real("Roughness"),
    real("InOffset"),
    real("OutOffset"),
    real("InitFlow"),
    real("MaxFlow"),
];

const PUMPS: &[Field] = &[
    text("Name"),
    text("From Node"),
    text("To Node"),
    text("Pcurve"),
    text("Status"),
    real("Startup"),
    real("Shutoff"),
];

const ORIFICES: &[Field] = &[
    text("Name"),
    text("From Node"),
    text("To Node"),
    text("Type"),
    real("Offset"),
    real("Qcoeff"),
    text("Gated"),
    real("CloseTime"),
];

const WEIRS: &[Field] = &[
    text("Name"),
    text("From Node"),
    text("To Node"),
    text("Type"),
    real("CrestHt"),
    real("Qcoeff"),
    text("Gated"),
    opt_int("EndCon"),
    real("EndCoeff"),
    text("Surcharge"),
    real("RoadWidth"),
    text("RoadSurf"),
    text("CoeffCurve"),
];

const OUTLET_COEFFS: &[Field] = &[real("Qcoeff"), real("Qexpon")];
const OUTLET_CURVE: &[Field] = &[text("Qcurve")];

const OUTLETS: KeywordLayout = KeywordLayout {
    common_start: &[
        text("Name"),
        text("From Node"),
        text("To Node"),
        real("Offset"),
        text("Type"),
    ],
    keyword_col: 4,
    variants: &[
        fixed("FUNCTIONAL/DEPTH", OUTLET_COEFFS),
        fixed("FUNCTIONAL/HEAD", OUTLET_COEFFS),
        fixed("TABULAR/DEPTH", OUTLET_CURVE),
        fixed("TABULAR/HEAD", OUTLET_CURVE),
    ],
    common_end: &[text("Gated")],
    layout: ColumnLayout::Named,
};

const XSECTIONS: KeywordLayout = KeywordLayout {
    common_start: &[text("Link"), text("Shape")],
    keyword_col: 1,
    variants: &[
        fixed(
            DEFAULT_KEYWORD,
            &[
                real("Geom1"),
                real("Geom2"),
                real("Geom3"),
                real("Geom4"),
                int("Barrels"),
                opt_int("Culvert"),
            ],
        ),
        fixed("IRREGULAR", &[text("Tsect")]),
        fixed("CUSTOM", &[real("Geom1"), text("Curve"), int("Barrels")]),
        fixed("STREET", &[text("Street")]),
    ],
    common_end: &[],
    layout: ColumnLayout::Named,
};

const STREETS: &[Field] = &[
    text("Name"),
    real("Tcrown"),
    real("Hcurb"),
    real("Sx"),
    real("nRoad"),
    real("a"),
    real("W"),
    int("Sides"),
    real("Tback"),
    real("Sback"),
    real("nBack"),
];

const INLET_USAGE: &[Field] = &[
    text("Inlet"),
    text("StreetXSEC"),
    real("Elevation"),
    real("SlopePct_Long"),
    int("Number"),
    real("CloggedPct"),
    real("Qmax"),
    real("aLocal"),
    real("wLocal"),
    real("Placement"),
    text("Conn1D_2D"),
    real("Conn_width"),
];

const LOSSES: &[Field] = &[
    text("Link"),
    real("Kentry"),
    real("Kexit"),
    real("Kavg"),
    text("Flap"),
    real("Seepage"),
];

// ---------------------------------------------------------------------------
// Water quality
// ---------------------------------------------------------------------------

const POLLUTANTS: &[Field] = &[
    text("Name"),
    text("Units"),
    real("Crain"),
    real("Cgw"),
    real("Crdii"),
    real("Kdecay"),
    text("SnowOnly"),
    text("CoPollutant"),
    real("CoFrac"),
    real("Cdwf"),
    real("Cinit"),
];

const LANDUSES: &[Field] = &[
    text("Name"),
    real("SweepInterval"),
    real("Availability"),
    real("LastSweep"),
];

const BUILDUP: &[Field] = &[
    text("Land_Use"),
    text("Pollutant"),
    text("Function"),
    real("Coeff1"),
    real("Coeff2"),
    real("Coeff3"),
    text("Per_Unit"),
];

const WASHOFF: &[Field] = &[
    text("Land_Use"),
    text("Pollutant"),
    text("Function"),
    real("Coeff1"),
    real("Coeff2"),
    real("SweepRmvl"),
    real("BmpRmvl"),
];

const TREATMENT: &[Field] = &[text("Node"), text("Pollutant"), rest("Function")];

// ---------------------------------------------------------------------------
// Boundary conditions
// ---------------------------------------------------------------------------

const INFLOWS: &[Field] = &[
    text("Node"),
    text("Constituent"),
    text("Time_Series"),
    text("Type"),
    real("Mfactor"),
    real("Sfactor"),
    real("Baseline"),
    text("Pattern"),
];

const DWF: &[Field] = &[
    text("Node"),
    text("Constituent"),
    real("Baseline"),
    text("Pat1"),
    text("Pat2"),
    text("Pat3"),
    text("Pat4"),
];

const RDII: &[Field] = &[text("Node"), text("UHgroup"), real("SewerArea")];

const UH_RESPONSE: &[Field] = &[
    text("Response"),
    real("R"),
    real("T"),
    real("K"),
    real("Dmax"),
    real("Drecov"),
    real("Dinit"),
];

const HYDROGRAPHS: KeywordLayout = KeywordLayout {
    common_start: &[text("Name"), text("Month_RG")],
    keyword_col: 1,
    variants: &[
        fixed("JAN", UH_RESPONSE),
        fixed("FEB", UH_RESPONSE),
        fixed("MAR", UH_RESPONSE),
        fixed("APR", UH_RESPONSE),
        fixed("MAY", UH_RESPONSE),
        fixed("JUN", UH_RESPONSE),
        fixed("JUL", UH_RESPONSE),
        fixed("AUG", UH_RESPONSE),
        fixed("SEP", UH_RESPONSE),
        fixed("OCT", UH_RESPONSE),
        fixed("NOV", UH_RESPONSE),
        fixed("DEC", UH_RESPONSE),
        fixed("ALL", UH_RESPONSE),
        bare(DEFAULT_KEYWORD),
    ],
    common_end: &[],
    layout: ColumnLayout::Named,
};

// ---------------------------------------------------------------------------
// Map and geometry
// ---------------------------------------------------------------------------

const TAGS: &[Field] = &[text("Object_Type"), text("Name"), text("Tag")];
const PROFILES: &[Field] = &[text("Name"), rest("Links")];
const COORDINATES: &[Field] = &[text("Node"), real("X"), real("Y")];
const VERTICES: &[Field] = &[text("Link"), real("X"), real("Y")];
const POLYGONS: &[Field] = &[text("Subcatchment"), real("X"), real("Y")];
const SYMBOLS: &[Field] = &[text("Gage"), real("X"), real("Y")];
const LABELS: &[Field] = &[
    real("X"),
    real("Y"),
    text("Label"),
    text("Anchor"),
    text("Font"),
    real("Size"),
    text("Bold"),
    text("Italic"),
];

const BACKDROP: KeywordLayout = KeywordLayout {
    common_start: &[text("Option")],
    keyword_col: 0,
    variants: &[
        fixed("FILE", ONE),
        fixed("DIMENSIONS", &[text("P"); 4]),
        fixed("UNITS", ONE),
        fixed("OFFSET", TWO),
        fixed("SCALING", TWO),
    ],
    common_end: &[],
    layout: ColumnLayout::Positional,
};

const _: () = {
    assert!(EVAPORATION.max_arity() <= MAX_PARAMS);
    assert!(TEMPERATURE.max_arity() <= MAX_PARAMS);
    assert!(ADJUSTMENTS.max_arity() <= MAX_PARAMS);
    assert!(BACKDROP.max_arity() <= MAX_PARAMS);
};

static SECTIONS: &[Section] = &[
    unsorted(plain("Title", PROJECT, Encoding::NoKeywords(FREE_TEXT))),
    unsorted(plain("Options", PROJECT, Encoding::NoKeywords(OPTION_VALUE))),
    unsorted(plain("Report", PROJECT, Encoding::NoKeywords(OPTION_VALUE))),
    plain("Files", PROJECT, Encoding::NoKeywords(FILES)),
    plain("Events", PROJECT, Encoding::NoKeywords(EVENTS)),
    located("Raingages", HYDROLOGY, GeometryAssoc::Misc, Encoding::Keywords(&RAINGAGES)),
    unsorted(plain("Evaporation", CLIMATE, Encoding::Keywords(&EVAPORATION))),
    unsorted(plain("Temperature", CLIMATE, Encoding::Keywords(&TEMPERATURE))),
    unsorted(plain("Adjustments", CLIMATE, Encoding::Keywords(&ADJUSTMENTS))),
    located(
        "Subcatchments",
        HYDROLOGY,
        GeometryAssoc::Subcatchments,
        Encoding::NoKeywords(SUBCATCHMENTS),
    ),
    folded(plain("Subareas", HYDROLOGY, Encoding::NoKeywords(SUBAREAS))),
    folded(plain("Infiltration", HYDROLOGY, Encoding::NoKeywords(INFILTRATION))),
    plain("LID_Controls", HYDROLOGY, Encoding::Wide(&LID_CONTROLS)),
    plain("LID_Usage", HYDROLOGY, Encoding::NoKeywords(LID_USAGE)),
    plain("Aquifers", HYDROLOGY, Encoding::NoKeywords(AQUIFERS)),
    plain("Groundwater", HYDROLOGY, Encoding::NoKeywords(GROUNDWATER)),
    plain("GWF", HYDROLOGY, Encoding::NoKeywords(GWF)),
    plain("Snowpacks", HYDROLOGY, Encoding::Wide(&SNOWPACKS)),
    located("Junctions", NODES, GeometryAssoc::Nodes, Encoding::NoKeywords(JUNCTIONS)),
    located("Outfalls", NODES, GeometryAssoc::Nodes, Encoding::Keywords(&OUTFALLS)),
    located("Dividers", NODES, GeometryAssoc::Nodes, Encoding::Keywords(&DIVIDERS)),
    located("Storage", NODES, GeometryAssoc::Nodes, Encoding::Keywords(&STORAGE)),
    located("Conduits", LINKS, GeometryAssoc::Links, Encoding::NoKeywords(CONDUITS)),
    located("Pumps", LINKS, GeometryAssoc::Links, Encoding::NoKeywords(PUMPS)),
    located("Orifices", LINKS, GeometryAssoc::Links, Encoding::NoKeywords(ORIFICES)),
    located("Weirs", LINKS, GeometryAssoc::Links, Encoding::NoKeywords(WEIRS)),
    located("Outlets", LINKS, GeometryAssoc::Links, Encoding::Keywords(&OUTLETS)),
    folded(plain("XSections", LINKS, Encoding::Keywords(&XSECTIONS))),
    unsorted(plain(
        "Transects",
        CURVES,
        Encoding::Custom(CustomSection::Transects),
    )),
    plain("Streets", INLETS, Encoding::NoKeywords(STREETS)),
    plain("Inlets", INLETS, Encoding::Custom(CustomSection::Inlets)),
    gis_only(located(
        "Inlet_Usage",
        INLETS,
        GeometryAssoc::Inlets,
        Encoding::NoKeywords(INLET_USAGE),
    )),
    folded(plain("Losses", LINKS, Encoding::NoKeywords(LOSSES))),
    unsorted(plain("Controls", CONTROLS, Encoding::NoKeywords(FREE_TEXT))),
    plain("Pollutants", WQ, Encoding::NoKeywords(POLLUTANTS)),
    plain("Landuses", WQ, Encoding::NoKeywords(LANDUSES)),
    plain("Coverages", WQ, Encoding::Custom(CustomSection::Coverages)),
    plain("Loadings", WQ, Encoding::Custom(CustomSection::Loadings)),
    plain("Buildup", WQ, Encoding::NoKeywords(BUILDUP)),
    plain("Washoff", WQ, Encoding::NoKeywords(WASHOFF)),
    plain("Treatment", WQ, Encoding::NoKeywords(TREATMENT)),
    plain("Inflows", BC, Encoding::NoKeywords(INFLOWS)),
    plain("DWF", BC, Encoding::NoKeywords(DWF)),
    plain("RDII", BC, Encoding::NoKeywords(RDII)),
    plain("Hydrographs", HYDROLOGY, Encoding::Keywords(&HYDROGRAPHS)),
    unsorted(plain("Curves", CURVES, Encoding::Custom(CustomSection::Curves))),
    unsorted(plain(
        "Timeseries",
        CURVES,
        Encoding::Custom(CustomSection::Timeseries),
    )),
    plain("Patterns", CURVES, Encoding::Custom(CustomSection::Patterns)),
    unsorted(plain("Map", PROJECT, Encoding::NoKeywords(OPTION_VALUE))),
    folded(plain("Tags", PROJECT, Encoding::NoKeywords(TAGS))),
    plain("Profiles", PROJECT, Encoding::NoKeywords(PROFILES)),
    folded(plain("Coordinates", "", Encoding::Geometry(COORDINATES))),
    folded(unsorted(plain("Vertices", "", Encoding::Geometry(VERTICES)))),
    folded(unsorted(plain("Polygons", "", Encoding::Geometry(POLYGONS)))),
    folded(plain("Symbols", "", Encoding::Geometry(SYMBOLS))),
    unsorted(plain("Labels", PROJECT, Encoding::NoKeywords(LABELS))),
    unsorted(plain("Backdrop", PROJECT, Encoding::Keywords(&BACKDROP))),
];

/// The ordered section catalog.
pub fn all_sections() -> &'static [Section] {
    SECTIONS
}
